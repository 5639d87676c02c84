use crate::error::SubtrackError;
use crate::service::onboarding::{OnboardingCommand, OnboardingState};

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::collections::HashMap;
use tracing::{debug, info};

/// Public messages handled by the onboarding actor.
#[derive(Debug)]
pub enum OnboardingActorMessage {
    /// Current wizard state of a user, initial state when none is held.
    Get(String, RpcReplyPort<OnboardingState>),
    /// Apply one command to a user's wizard and reply with the new state.
    Apply(
        String,
        OnboardingCommand,
        RpcReplyPort<Result<OnboardingState, SubtrackError>>,
    ),
    /// Drop a user's wizard state.
    Reset(String),
}

/// Handle for interacting with the onboarding actor.
#[derive(Clone)]
pub struct OnboardingHandle {
    actor: ActorRef<OnboardingActorMessage>,
}

impl OnboardingHandle {
    pub async fn state(&self, user_id: impl AsRef<str>) -> Result<OnboardingState, SubtrackError> {
        ractor::call!(
            self.actor,
            OnboardingActorMessage::Get,
            user_id.as_ref().to_string()
        )
        .map_err(|e| SubtrackError::ActorError(format!("Get RPC failed: {e}")))
    }

    pub async fn apply(
        &self,
        user_id: impl AsRef<str>,
        command: OnboardingCommand,
    ) -> Result<OnboardingState, SubtrackError> {
        ractor::call!(
            self.actor,
            OnboardingActorMessage::Apply,
            user_id.as_ref().to_string(),
            command
        )
        .map_err(|e| SubtrackError::ActorError(format!("Apply RPC failed: {e}")))?
    }

    pub async fn reset(&self, user_id: impl AsRef<str>) {
        let _ = ractor::cast!(
            self.actor,
            OnboardingActorMessage::Reset(user_id.as_ref().to_string())
        );
    }
}

/// Wizard states keyed by user id.
struct OnboardingActorState {
    wizards: HashMap<String, OnboardingState>,
}

struct OnboardingActor;

#[ractor::async_trait]
impl Actor for OnboardingActor {
    type Msg = OnboardingActorMessage;
    type State = OnboardingActorState;
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _arguments: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("OnboardingActor started");
        Ok(OnboardingActorState {
            wizards: HashMap::new(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            OnboardingActorMessage::Get(user_id, rp) => {
                let current = state.wizards.get(&user_id).cloned().unwrap_or_default();
                let _ = rp.send(current);
            }
            OnboardingActorMessage::Apply(user_id, command, rp) => {
                debug!(%user_id, ?command, "onboarding command");
                let wizard = state.wizards.entry(user_id).or_default();
                // work on a copy so a failed command leaves the stored state alone
                let mut next = wizard.clone();
                let result = match command.apply(&mut next) {
                    Ok(()) => {
                        *wizard = next.clone();
                        Ok(next)
                    }
                    Err(e) => Err(e),
                };
                let _ = rp.send(result);
            }
            OnboardingActorMessage::Reset(user_id) => {
                state.wizards.remove(&user_id);
            }
        }
        Ok(())
    }
}

/// Spawn an unnamed onboarding actor and return its handle.
pub async fn spawn() -> Result<OnboardingHandle, SubtrackError> {
    let (actor, _jh) = Actor::spawn(None, OnboardingActor, ())
        .await
        .map_err(|e| SubtrackError::ActorError(format!("failed to spawn OnboardingActor: {e}")))?;
    Ok(OnboardingHandle { actor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_is_kept_per_user() {
        let handle = spawn().await.unwrap();
        handle.apply("alice", OnboardingCommand::Next).await.unwrap();
        handle.apply("alice", OnboardingCommand::Next).await.unwrap();
        handle.apply("bob", OnboardingCommand::GoTo(4)).await.unwrap();

        assert_eq!(handle.state("alice").await.unwrap().current_step, 2);
        assert_eq!(handle.state("bob").await.unwrap().current_step, 4);
        assert_eq!(handle.state("carol").await.unwrap(), OnboardingState::default());
    }

    #[tokio::test]
    async fn failed_command_leaves_state_unchanged() {
        let handle = spawn().await.unwrap();
        handle.apply("alice", OnboardingCommand::Next).await.unwrap();
        let err = handle
            .apply(
                "alice",
                OnboardingCommand::UpdateDraft(3, Default::default()),
            )
            .await;
        assert!(matches!(err, Err(SubtrackError::NotFound(_))));
        assert_eq!(handle.state("alice").await.unwrap().current_step, 1);
    }

    #[tokio::test]
    async fn reset_drops_state() {
        let handle = spawn().await.unwrap();
        handle.apply("alice", OnboardingCommand::Complete).await.unwrap();
        handle.reset("alice").await;
        assert!(!handle.state("alice").await.unwrap().is_completed);
    }
}
