//! Walking units and dispatching calls to checkers

use crate::checker::CallSite;
use crate::error::{AnalysisError, HandlerError};
use crate::registry::CheckerRegistry;
use crate::report::Reporter;
use lh_common::DiagnosticSink;
use lh_ir::Unit;
use log::{debug, trace};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Offer every call in `unit` to every checker with a handler for it
///
/// Functions are visited in unit order, blocks in natural order. An error
/// reported by a handler only ends that handler's work on that call. An
/// internal fault ends the run. A handler that panics is reported as an
/// internal fault before the panic is resumed.
pub fn analyse_unit(registry: &CheckerRegistry, unit: &Unit, sink: &mut DiagnosticSink) -> Result<(), AnalysisError> {
    let mut reporter = Reporter::new(sink);

    for function in unit.functions() {
        trace!("analysing {}", function.name);
        for block in function.blocks_in_natural_order() {
            for statement in &block.statements {
                let Some(callee) = statement.callee_name() else {
                    continue;
                };
                let Some(site) = CallSite::new(unit, function, statement, &callee) else {
                    continue;
                };

                for checker in registry.checkers() {
                    let Some(handler) = checker.handlers().get(&callee) else {
                        continue;
                    };
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&site, &mut reporter)));
                    let result = match outcome {
                        Ok(result) => result,
                        Err(payload) => {
                            reporter.internal_fault(checker.name(), &panic_message(payload.as_ref()), &site);
                            panic::resume_unwind(payload);
                        }
                    };
                    match result {
                        Ok(()) => {}
                        Err(HandlerError::Reported) => {
                            debug!("{} stopped checking call to {callee}", checker.name());
                        }
                        Err(HandlerError::Internal(message)) => {
                            reporter.internal_fault(checker.name(), &message, &site);
                            return Err(AnalysisError::InternalFault {
                                checker: checker.name().to_string(),
                                function: function.name.clone(),
                                callee: callee.clone(),
                                message,
                            });
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// One analysis run: the enabled checkers and everything they reported
pub struct AnalysisRun {
    registry: CheckerRegistry,
    sink: DiagnosticSink,
}

impl AnalysisRun {
    pub fn new(registry: CheckerRegistry) -> Self {
        Self {
            registry,
            sink: DiagnosticSink::new(),
        }
    }

    pub fn registry(&self) -> &CheckerRegistry {
        &self.registry
    }

    pub fn analyse(&mut self, unit: &Unit) -> Result<(), AnalysisError> {
        analyse_unit(&self.registry, unit, &mut self.sink)
    }

    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.sink
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticSink {
        &mut self.sink
    }
}
