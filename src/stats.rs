/// What a single turn of the loop did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Cycle {
    /// Pins registered once the turn's commands were applied.
    pub watching: usize,
    /// Descriptors the wait reported ready.
    pub ready: usize,
    pub delivered: usize,
    /// Notifications lost to a full queue.
    pub dropped: usize,
}

impl Cycle {
    fn is_quiet(&self) -> bool {
        self.ready == 0 && self.delivered == 0 && self.dropped == 0
    }
}

/// Per-turn resource state updates for the watcher loop.
///
/// A turn which neither changed the registered pin count nor saw readiness is
/// not reported.
pub(crate) struct Stats {
    #[cfg(feature = "tracing")]
    span: tracing_impl::Span,
    watching: usize,
}

impl Stats {
    pub fn new() -> Self {
        #[cfg(feature = "tracing")]
        let span = tracing_impl::trace_span!(
            "runtime.resource",
            concrete_type = "GpioWatcher",
            kind = "pin",
            is_internal = false,
            inherits_child_attrs = true,
        );

        let stats = Self {
            #[cfg(feature = "tracing")]
            span,
            watching: 0,
        };

        stats.emit(Cycle::default());
        stats
    }

    pub fn record(&mut self, cycle: Cycle) {
        if cycle.watching == self.watching && cycle.is_quiet() {
            return;
        }

        self.watching = cycle.watching;
        self.emit(cycle);
    }

    #[cfg(feature = "tracing")]
    fn emit(&self, cycle: Cycle) {
        self.span.in_scope(|| {
            tracing_impl::trace!(
                target: "runtime::resource::state_update",
                watching = cycle.watching,
                watching.unit = "pins",
                watching.op = "override",
                ready = cycle.ready,
                delivered = cycle.delivered,
                delivered.unit = "notifications",
                delivered.op = "add",
                dropped = cycle.dropped,
                dropped.unit = "notifications",
                dropped.op = "override",
            );
        });
    }

    #[cfg(not(feature = "tracing"))]
    fn emit(&self, _cycle: Cycle) {}

    #[cfg(test)]
    pub(crate) fn watching(&self) -> usize {
        self.watching
    }
}
