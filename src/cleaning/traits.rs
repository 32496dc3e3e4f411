// Phrase cleaner trait: the shared shape of the removal stages.
//
// Cleaners never mutate phrases. They split the input into what stays and
// what was removed so the caller can report both.

/// Outcome of a cleaning stage. Both lists keep input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cleaned {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
}

impl Cleaned {
    /// Everything kept, nothing removed.
    pub fn unchanged(phrases: Vec<String>) -> Self {
        Self {
            kept: phrases,
            removed: Vec::new(),
        }
    }
}

/// A stage that removes phrases matching some condition.
pub trait PhraseCleaner {
    /// Short stage name used in log events.
    fn name(&self) -> &'static str;

    /// Split `phrases` into kept and removed.
    fn clean(&self, phrases: Vec<String>) -> Cleaned;
}
