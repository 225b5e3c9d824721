use uuid::Uuid;

/// Source of record and payment identifiers.
///
/// Every call must return an id never handed out before, including for
/// submissions that arrive within the same clock tick.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids (`<prefix>1`, `<prefix>2`, ...) for unit tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

#[cfg(test)]
impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 0,
        }
    }
}

#[cfg(test)]
impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{}{}", self.prefix, self.next)
    }
}
