//! Greeter use cases.

use std::time::Duration;

use futures::StreamExt;

use crate::application::session::{Inbound, OutboundStream, outbound};
use crate::domain::call::Deadline;
use crate::domain::greeting::{GreetingAccumulator, Person};
use crate::domain::status::CallError;

/// Number of work steps `greet_with_deadline` performs.
const DEADLINE_STEPS: u32 = 3;

/// Pacing for the greeter streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreeterSettings {
    /// Outbound channel capacity per call.
    pub stream_buffer: usize,
    /// Delay between `greet_many_times` items.
    pub interval: Duration,
    /// Items emitted by `greet_many_times`.
    pub repeat: u32,
    /// Duration of one `greet_with_deadline` work step.
    pub step_delay: Duration,
}

impl Default for GreeterSettings {
    fn default() -> Self {
        Self {
            stream_buffer: 16,
            interval: Duration::from_secs(1),
            repeat: 10,
            step_delay: Duration::from_secs(1),
        }
    }
}

/// Greeter use cases.
#[derive(Debug, Clone, Default)]
pub struct GreeterService {
    settings: GreeterSettings,
}

impl GreeterService {
    /// Create the service.
    #[must_use]
    pub const fn new(settings: GreeterSettings) -> Self {
        Self { settings }
    }

    /// `"Hello {first_name}"`.
    #[must_use]
    pub fn greet(&self, person: &Person) -> String {
        person.hello()
    }

    /// Emit `repeat` numbered greetings, one per interval.
    #[must_use]
    pub fn greet_many_times(&self, person: Person) -> OutboundStream<String> {
        let GreeterSettings {
            stream_buffer,
            interval,
            repeat,
            ..
        } = self.settings;
        let (tx, rx) = outbound(stream_buffer);

        tokio::spawn(async move {
            for index in 0..repeat {
                if tx.send(person.hello_numbered(index)).await.is_err() {
                    tracing::debug!(index, "greet stream abandoned by caller");
                    return;
                }
                if index + 1 == repeat {
                    break;
                }
                tokio::select! {
                    () = tx.abandoned() => {
                        tracing::debug!(index, "greet stream abandoned between items");
                        return;
                    }
                    () = tokio::time::sleep(interval) => {}
                }
            }
        });

        rx
    }

    /// Concatenate one greeting per inbound person, replying after the
    /// inbound side closes.
    ///
    /// # Errors
    ///
    /// Propagates an inbound sequence error.
    pub async fn long_greet(&self, mut inbound: Inbound<Person>) -> Result<String, CallError> {
        let mut greetings = GreetingAccumulator::default();
        while let Some(person) = inbound.next().await {
            greetings.push(&person?);
        }
        Ok(greetings.finish())
    }

    /// Reply to every inbound person as it arrives.
    #[must_use]
    pub fn greet_everyone(&self, mut inbound: Inbound<Person>) -> OutboundStream<String> {
        let (tx, rx) = outbound(self.settings.stream_buffer);

        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    () = tx.abandoned() => return,
                    item = inbound.next() => item,
                };
                match item {
                    Some(Ok(person)) => {
                        if tx.send(person.exclaim()).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(err)) => {
                        tx.fail(err).await;
                        return;
                    }
                    None => return,
                }
            }
        });

        rx
    }

    /// Perform a fixed number of slow work steps, then greet.
    ///
    /// The deadline is checked before every step and bounds the step itself,
    /// so the call fails as soon as it can no longer finish in time.
    ///
    /// # Errors
    ///
    /// `DeadlineExceeded` when `deadline` elapses first.
    pub async fn greet_with_deadline(
        &self,
        person: &Person,
        deadline: Option<Deadline>,
    ) -> Result<String, CallError> {
        for step in 0..DEADLINE_STEPS {
            let Some(deadline) = deadline else {
                tokio::time::sleep(self.settings.step_delay).await;
                continue;
            };
            if deadline.is_expired() {
                return Err(exceeded(step));
            }
            let until = tokio::time::Instant::from_std(deadline.instant());
            if tokio::time::timeout_at(until, tokio::time::sleep(self.settings.step_delay))
                .await
                .is_err()
            {
                return Err(exceeded(step));
            }
        }
        Ok(person.hello())
    }
}

fn exceeded(step: u32) -> CallError {
    tracing::debug!(step, "deadline elapsed during greeting");
    CallError::DeadlineExceeded(format!(
        "deadline exceeded after {step} of {DEADLINE_STEPS} steps"
    ))
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::domain::status::StatusCode;

    fn fast() -> GreeterService {
        GreeterService::new(GreeterSettings {
            stream_buffer: 4,
            interval: Duration::from_millis(1),
            repeat: 3,
            step_delay: Duration::from_millis(20),
        })
    }

    fn people(names: &[&str]) -> Inbound<Person> {
        stream::iter(
            names
                .iter()
                .map(|n| Ok(Person::new(*n, "")))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    #[test]
    fn greets() {
        assert_eq!(fast().greet(&Person::new("Ada", "L")), "Hello Ada");
    }

    #[tokio::test]
    async fn greets_many_times_in_order() {
        let items: Vec<String> = fast()
            .greet_many_times(Person::new("Ada", ""))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(
            items,
            vec!["Hello Ada number 0", "Hello Ada number 1", "Hello Ada number 2"]
        );
    }

    #[tokio::test]
    async fn long_greet_concatenates() {
        let text = fast().long_greet(people(&["Ada", "Grace"])).await.unwrap();
        assert_eq!(text, "Hello Ada! Hello Grace! ");
    }

    #[tokio::test]
    async fn greet_everyone_replies_per_item() {
        let replies: Vec<String> = fast()
            .greet_everyone(people(&["Ada", "Grace", "Linus"]))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(replies, vec!["Hello Ada! ", "Hello Grace! ", "Hello Linus! "]);
    }

    #[tokio::test]
    async fn deadline_long_enough_succeeds() {
        let deadline = Deadline::from_timeout(Duration::from_secs(5));
        let reply = fast()
            .greet_with_deadline(&Person::new("Ada", ""), Some(deadline))
            .await
            .unwrap();
        assert_eq!(reply, "Hello Ada");
    }

    #[tokio::test]
    async fn short_deadline_is_exceeded() {
        let deadline = Deadline::from_timeout(Duration::from_millis(30));
        let err = fast()
            .greet_with_deadline(&Person::new("Ada", ""), Some(deadline))
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::DeadlineExceeded);
    }

    #[tokio::test]
    async fn no_deadline_runs_all_steps() {
        let reply = fast()
            .greet_with_deadline(&Person::new("Ada", ""), None)
            .await
            .unwrap();
        assert_eq!(reply, "Hello Ada");
    }
}
