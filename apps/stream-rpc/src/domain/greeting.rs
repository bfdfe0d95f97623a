//! Greeting payloads.

/// Name pair carried by every greet request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl Person {
    /// Build a person from both names.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// `"Hello {first_name}"`.
    #[must_use]
    pub fn hello(&self) -> String {
        format!("Hello {}", self.first_name)
    }

    /// `"Hello {first_name} number {index}"`.
    #[must_use]
    pub fn hello_numbered(&self, index: u32) -> String {
        format!("Hello {} number {index}", self.first_name)
    }

    /// `"Hello {first_name}! "`, the per-item reply of the streaming greets.
    #[must_use]
    pub fn exclaim(&self) -> String {
        format!("Hello {}! ", self.first_name)
    }
}

/// Concatenates one exclamation per inbound person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GreetingAccumulator {
    text: String,
}

impl GreetingAccumulator {
    /// Append the greeting for `person`.
    pub fn push(&mut self, person: &Person) {
        self.text.push_str(&person.exclaim());
    }

    /// The accumulated text.
    #[must_use]
    pub fn finish(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        let ada = Person::new("Ada", "Lovelace");
        assert_eq!(ada.hello(), "Hello Ada");
        assert_eq!(ada.hello_numbered(3), "Hello Ada number 3");
        assert_eq!(ada.exclaim(), "Hello Ada! ");
    }

    #[test]
    fn accumulates_in_order() {
        let mut acc = GreetingAccumulator::default();
        acc.push(&Person::new("Ada", ""));
        acc.push(&Person::new("Grace", ""));
        assert_eq!(acc.finish(), "Hello Ada! Hello Grace! ");
    }

    #[test]
    fn empty_accumulator_is_empty() {
        assert_eq!(GreetingAccumulator::default().finish(), "");
    }
}
