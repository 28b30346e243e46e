//! Fixed-delay render timer
//!
//! A [`RenderScheduler`] owns one timer thread. While running it invokes its
//! tick callback immediately and then again `interval` after each tick
//! returns, so a slow tick delays the next one instead of overlapping it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use sunclock_core::{Error, Result};
use tracing::{debug, error, info};

enum Command {
    Start,
    Stop,
    Shutdown,
}

/// Periodic trigger with Stopped and Running states.
pub struct RenderScheduler {
    commands: Sender<Command>,
    running: AtomicBool,
    ticks: Arc<AtomicU64>,
    interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RenderScheduler {
    /// Spawn the timer thread in the Stopped state.
    pub fn new<F>(interval: Duration, tick: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = unbounded();
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&ticks);

        let timer = thread::Builder::new()
            .name("sunclock-timer".into())
            .spawn(move || timer_loop(rx, interval, tick, counter))
            .map_err(|e| Error::Other(format!("failed to spawn render timer: {}", e)))?;

        Ok(Self {
            commands: tx,
            running: AtomicBool::new(false),
            ticks,
            interval,
            timer: Mutex::new(Some(timer)),
        })
    }

    /// Stopped → Running. The first tick fires immediately.
    ///
    /// Returns `false` if the timer was already running or has been shut down.
    pub fn start(&self) -> bool {
        let timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if timer.is_none() || self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.commands.send(Command::Start).is_ok()
    }

    /// Running → Stopped. A tick already in progress runs to completion.
    ///
    /// Returns `false` if the timer was already stopped.
    pub fn stop(&self) -> bool {
        let timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if timer.is_none() || !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.commands.send(Command::Stop).is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Stop the timer and wait for its thread to exit, letting an in-flight
    /// tick finish. Safe to call more than once.
    pub fn shutdown(&self) {
        let handle = {
            let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
            self.running.store(false, Ordering::SeqCst);
            timer.take()
        };
        if let Some(handle) = handle {
            let _ = self.commands.send(Command::Shutdown);
            if handle.thread().id() == thread::current().id() {
                // dropped from inside a tick; the loop exits on its own
                return;
            }
            if handle.join().is_err() {
                error!("render timer thread panicked");
            }
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("running", &self.is_running())
            .field("ticks", &self.ticks())
            .field("interval", &self.interval)
            .finish()
    }
}

fn timer_loop<F: Fn()>(commands: Receiver<Command>, interval: Duration, tick: F, ticks: Arc<AtomicU64>) {
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            Some(at) => match commands.recv_deadline(at) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        match command {
            Some(Command::Start) => {
                if deadline.is_none() {
                    info!("starting timer ...");
                    deadline = Some(Instant::now());
                }
            }
            Some(Command::Stop) => {
                if deadline.take().is_some() {
                    info!("stopping timer ...");
                }
            }
            Some(Command::Shutdown) => break,
            None => {
                if panic::catch_unwind(AssertUnwindSafe(&tick)).is_err() {
                    error!("render tick panicked");
                }
                let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(tick = n, "timer tick finished");
                // fixed delay: measured from the end of the tick
                deadline = Some(Instant::now() + interval);
            }
        }
    }

    debug!("render timer exiting");
}
