//! Span instrumentation of the diff passes.
//!
//! With the `tracing` feature enabled every pass of the engine runs inside an
//! `info_span!`, and [`init_tracing`] installs a subscriber that accumulates
//! the time spent in each span name per [`TimingScope`].  Without the feature
//! the spans compile to nothing.

#[cfg(feature = "tracing")]
mod enabled {
    use std::{
        cell::RefCell,
        collections::{BTreeMap, HashMap},
        sync::Once,
        time::{Duration, Instant},
    };

    use tracing_subscriber::{
        Layer, Registry, layer::Context, layer::SubscriberExt, registry::LookupSpan,
        util::SubscriberInitExt,
    };

    type Timings = BTreeMap<&'static str, (Duration, usize)>;

    thread_local! {
        static TIMINGS: RefCell<HashMap<TimingScope, Timings>> = RefCell::new(HashMap::new());
        static TIMING_SCOPE: RefCell<TimingScope> = const { RefCell::new(TimingScope::Compute) };
    }

    /// The bucket that closed spans are accounted to.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum TimingScope {
        /// Computing changesets.
        Compute,
        /// Checking computed changesets, e.g. rebuilding the current version.
        Verify,
    }

    pub struct TimingScopeGuard {
        previous: TimingScope,
    }

    impl Drop for TimingScopeGuard {
        fn drop(&mut self) {
            TIMING_SCOPE.with(|scope| *scope.borrow_mut() = self.previous);
        }
    }

    /// Accounts spans closed on this thread to `scope` until the guard drops.
    pub fn set_timing_scope(scope: TimingScope) -> TimingScopeGuard {
        let previous = TIMING_SCOPE.with(|current| current.replace(scope));
        TimingScopeGuard { previous }
    }

    struct TimingLayer;

    impl<S> Layer<S> for TimingLayer
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(
            &self,
            _attrs: &tracing::span::Attributes<'_>,
            id: &tracing::Id,
            ctx: Context<'_, S>,
        ) {
            if let Some(span) = ctx.span(id) {
                span.extensions_mut().insert(Instant::now());
            }
        }

        fn on_close(&self, id: tracing::Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            let Some(elapsed) = span.extensions().get::<Instant>().map(Instant::elapsed) else {
                return;
            };
            let name = span.metadata().name();
            let scope = TIMING_SCOPE.with(|scope| *scope.borrow());
            TIMINGS.with(|timings| {
                let mut timings = timings.borrow_mut();
                let entry = timings
                    .entry(scope)
                    .or_default()
                    .entry(name)
                    .or_insert((Duration::ZERO, 0));
                entry.0 += elapsed;
                entry.1 += 1;
            });
        }
    }

    pub fn init_tracing() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = Registry::default().with(TimingLayer).try_init();
        });
    }

    /// Returns the total duration and count of every span name closed on this
    /// thread within `scope`, longest first.
    pub fn method_timings(scope: TimingScope) -> Vec<(&'static str, Duration, usize)> {
        TIMINGS.with(|timings| {
            let timings = timings.borrow();
            let mut entries: Vec<_> = timings
                .get(&scope)
                .into_iter()
                .flatten()
                .map(|(name, (duration, count))| (*name, *duration, *count))
                .collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1));
            entries
        })
    }

    #[doc(hidden)]
    pub fn dump_method_timings() {
        for scope in [TimingScope::Compute, TimingScope::Verify] {
            eprintln!("{scope:?} timings (desc):");
            for (name, duration, count) in method_timings(scope) {
                eprintln!("  {name}: {duration:?} ({count}x)");
            }
        }
    }

    #[doc(hidden)]
    pub fn reset_method_timings() {
        init_tracing();
        TIMINGS.with(|timings| timings.borrow_mut().clear());
    }

    pub use tracing::info_span;
}

#[cfg(not(feature = "tracing"))]
mod disabled {
    use std::time::Duration;

    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum TimingScope {
        Compute,
        Verify,
    }

    pub struct TimingScopeGuard;

    pub fn set_timing_scope(_scope: TimingScope) -> TimingScopeGuard {
        TimingScopeGuard
    }

    pub fn init_tracing() {}

    pub fn method_timings(_scope: TimingScope) -> Vec<(&'static str, Duration, usize)> {
        Vec::new()
    }

    #[doc(hidden)]
    pub fn dump_method_timings() {}

    #[doc(hidden)]
    pub fn reset_method_timings() {}

    macro_rules! info_span {
        ($name:expr) => {{ $crate::tracing_support::NoOpSpan }};
        ($name:expr, $($fields:tt)*) => {{ $crate::tracing_support::NoOpSpan }};
    }

    pub(crate) use info_span;

    pub struct NoOpSpan;

    impl NoOpSpan {
        pub fn entered(self) -> NoOpSpanGuard {
            NoOpSpanGuard
        }
    }

    pub struct NoOpSpanGuard;
}

#[cfg(feature = "tracing")]
pub use enabled::*;

#[cfg(not(feature = "tracing"))]
pub use disabled::*;
