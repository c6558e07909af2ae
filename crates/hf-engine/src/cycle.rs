//! Discrete-update cycle run at every event point.

use hf_core::MAX_TIME;

use crate::backend::ModelBackend;
use crate::error::EngineResult;
use crate::event::EventInfo;
use crate::instance::{Instance, InterfaceKind};

impl<B: ModelBackend> Instance<B> {
    /// Mark due rates, run a major output/update step, schedule the next
    /// time event and (model exchange) re-baseline the event indicators.
    pub(crate) fn discrete_cycle(&mut self, op: &'static str) -> EngineResult<EventInfo> {
        let scan = self.schedule.mark_hits(self.clock);
        if scan.base_rate_periodic {
            self.purely_discrete = true;
        }
        // Outputs were already evaluated by initialization, so the
        // offset-sampled rate only runs once continuous time was entered.
        self.schedule.set_offset_sampled_hit(self.entered_continuous);

        if !self.purely_discrete || scan.any_hit {
            self.major_step(|this| {
                this.eval_outputs(op)?;
                this.eval_update(op)
            })?;
        }

        let next = self.schedule.advance();
        tracing::trace!(t = self.clock, next, hit = scan.any_hit, "discrete cycle");

        if self.kind == InterfaceKind::ModelExchange {
            self.eval_zero_crossings(op)?;
            self.detector.snapshot(&self.indicators);
        }
        self.should_recompute = true;

        Ok(EventInfo {
            new_discrete_states_needed: false,
            terminate_simulation: false,
            nominals_of_continuous_states_changed: false,
            values_of_continuous_states_changed: std::mem::take(&mut self.solver_reset),
            next_event_time_defined: next < MAX_TIME,
            next_event_time: next,
        })
    }
}
