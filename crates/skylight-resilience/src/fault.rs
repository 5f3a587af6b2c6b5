//! Global capture of failures that escaped all structured handling
//!
//! Installed once per page before any UI work. Faults are logged and counted
//! but never persisted: only the boundary and the bootstrap know which
//! channel a record belongs to.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::panic::PanicHookInfo;
use std::rc::Rc;
use std::sync::Once;

use crate::record::Failure;

/// Kind of unhandled failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    UncaughtException,
    UnhandledRejection,
    Panic,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::UncaughtException => write!(f, "uncaught exception"),
            FaultKind::UnhandledRejection => write!(f, "unhandled promise rejection"),
            FaultKind::Panic => write!(f, "panic"),
        }
    }
}

/// A failure that reached the top of the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledFailure {
    pub kind: FaultKind,
    pub message: String,
    pub location: Option<String>,
}

impl UnhandledFailure {
    pub fn uncaught_exception(message: impl Into<String>, location: Option<String>) -> Self {
        Self {
            kind: FaultKind::UncaughtException,
            message: message.into(),
            location,
        }
    }

    pub fn unhandled_rejection(reason: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::UnhandledRejection,
            message: reason.into(),
            location: None,
        }
    }

    pub fn panic(message: impl Into<String>, location: Option<String>) -> Self {
        Self {
            kind: FaultKind::Panic,
            message: message.into(),
            location,
        }
    }

    pub fn from_panic_info(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Box<dyn Any>".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        Self::panic(message, location)
    }

    /// What the host should do with its own default reporting
    pub fn disposition(&self) -> Disposition {
        match self.kind {
            FaultKind::UnhandledRejection => Disposition::Suppress,
            FaultKind::UncaughtException | FaultKind::Panic => Disposition::Propagate,
        }
    }
}

/// Whether the host's default reporting should still run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Leave the host's default handling in place
    Propagate,
    /// Mark the event handled; this layer owns reporting it
    Suppress,
}

/// Host side of the capture: wires event listeners to the capture
pub trait FaultHost {
    fn attach(&self, capture: Rc<GlobalFaultCapture>);
}

/// Host without global events; only the panic hook applies
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedFaultHost;

impl FaultHost for DetachedFaultHost {
    fn attach(&self, _capture: Rc<GlobalFaultCapture>) {}
}

type PanicObserver = Box<dyn Fn(&Failure)>;

thread_local! {
    static INSTALLED: OnceCell<Rc<GlobalFaultCapture>> = const { OnceCell::new() };
}

static PANIC_HOOK: Once = Once::new();

#[derive(Default)]
pub struct GlobalFaultCapture {
    uncaught: Cell<u32>,
    rejections: Cell<u32>,
    panics: Cell<u32>,
    panic_observers: RefCell<Vec<PanicObserver>>,
}

impl GlobalFaultCapture {
    /// Install the page-wide capture.
    ///
    /// Fails if a capture is already installed; the first one stays active.
    pub fn install(host: &dyn FaultHost) -> crate::Result<Rc<GlobalFaultCapture>> {
        if Self::installed().is_some() {
            tracing::warn!("Global fault capture is already installed");
            return Err(crate::ResilienceError::AlreadyInstalled(
                "global fault capture",
            ));
        }

        let capture = Rc::new(GlobalFaultCapture::default());
        INSTALLED.with(|cell| cell.set(Rc::clone(&capture))).map_err(|_| {
            crate::ResilienceError::AlreadyInstalled("global fault capture")
        })?;
        host.attach(Rc::clone(&capture));
        install_panic_hook();

        tracing::debug!("Global fault capture installed");
        Ok(capture)
    }

    /// The capture installed on this page, if any
    pub fn installed() -> Option<Rc<GlobalFaultCapture>> {
        INSTALLED
            .try_with(|cell| cell.get().cloned())
            .ok()
            .flatten()
    }

    /// Log an unhandled failure and tell the host what to do with it
    pub fn handle(&self, failure: &UnhandledFailure) -> Disposition {
        let counter = match failure.kind {
            FaultKind::UncaughtException => &self.uncaught,
            FaultKind::UnhandledRejection => &self.rejections,
            FaultKind::Panic => &self.panics,
        };
        counter.set(counter.get().saturating_add(1));

        tracing::error!(
            kind = %failure.kind,
            location = failure.location.as_deref(),
            "Unhandled failure: {}",
            failure.message
        );

        if failure.kind == FaultKind::Panic {
            self.notify_panic(&Failure::new(failure.message.clone()));
        }

        failure.disposition()
    }

    /// Register a callback run for every captured panic
    pub fn on_panic(&self, observer: impl Fn(&Failure) + 'static) {
        self.panic_observers.borrow_mut().push(Box::new(observer));
    }

    pub fn captured(&self, kind: FaultKind) -> u32 {
        match kind {
            FaultKind::UncaughtException => self.uncaught.get(),
            FaultKind::UnhandledRejection => self.rejections.get(),
            FaultKind::Panic => self.panics.get(),
        }
    }

    fn notify_panic(&self, failure: &Failure) {
        // A panic raised while an observer runs must not re-enter the list
        let Ok(observers) = self.panic_observers.try_borrow() else {
            return;
        };
        for observer in observers.iter() {
            observer(failure);
        }
    }
}

impl fmt::Debug for GlobalFaultCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalFaultCapture")
            .field("uncaught", &self.uncaught.get())
            .field("rejections", &self.rejections.get())
            .field("panics", &self.panics.get())
            .finish_non_exhaustive()
    }
}

/// Route panics through the installed capture, then the previous hook
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        #[cfg(all(feature = "web", target_arch = "wasm32"))]
        let previous: Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync> =
            Box::new(console_error_panic_hook::hook);
        #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
        let previous = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            if let Some(capture) = GlobalFaultCapture::installed() {
                capture.handle(&UnhandledFailure::from_panic_info(info));
            }
            previous(info);
        }));
    });
}
