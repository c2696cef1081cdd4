//! Orchestrator for the motion coaching loop
//!
//! Connects all components: Sensor -> Sampler -> Classifier -> State ->
//! Dispatcher -> Chat Gateway -> Voice + message log.
//!
//! All motion state lives inside one async task. Sensor callbacks only forward
//! events into a channel, and gateway calls run as separate tasks whose
//! completions come back into the same loop, so nothing here needs a lock.

use crate::coach::dispatcher::{DispatchInput, Dispatcher};
use crate::coach::gateway::{ChatGateway, ChatReply, ChatRequest};
use crate::coach::prompts::{CoachingPrompt, PromptKind};
use crate::integration::config::CoachConfig;
use crate::messages::{Message, MessageMetadata, MessageOrigin, MessageStorage};
use crate::motion::classifier::MovementClassifier;
use crate::motion::sampler::{MotionSampler, SensorEvent};
use crate::motion::source::{
    MotionPermission, NoPermissionGate, PermissionState, SensorSource, Subscription,
};
use crate::motion::state::{StateTracker, TransitionEvent};
use crate::speech::voice::Voice;
use crate::{CoachError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Commands that can be sent to the orchestrator
#[derive(Debug, Clone)]
pub enum OrchestratorCommand {
    /// Send a user-typed message to the model
    SendText(String),

    /// Ask for motion permission and start sensing
    EnableMotion,

    /// Turn voice output on or off
    SetSpeechEnabled(bool),

    /// Tear down and stop the loop
    Shutdown,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// Sensor listener registered
    MotionEnabled,

    /// Permission refused; running without motion
    PermissionDenied(String),

    /// Movement state changed
    Transition(TransitionEvent),

    /// A coaching prompt was submitted to the gateway
    PromptDispatched { request_id: Uuid, kind: PromptKind },

    /// A user message was submitted to the gateway
    MessageSent { request_id: Uuid },

    /// A user message was rejected before sending
    InvalidMessage(String),

    /// The model replied
    Reply {
        request_id: Uuid,
        origin: MessageOrigin,
        text: String,
        spoken: bool,
    },

    /// A gateway call failed; that dispatch is dropped
    DispatchFailed {
        request_id: Uuid,
        origin: MessageOrigin,
        error: String,
    },

    /// Voice output toggled
    SpeechToggled(bool),

    /// Orchestrator has shut down
    Shutdown,
}

/// Handle for controlling the orchestrator
pub struct OrchestratorHandle {
    /// Command sender
    command_tx: mpsc::UnboundedSender<OrchestratorCommand>,

    /// Event receiver
    event_rx: Receiver<OrchestratorEvent>,

    /// Visible conversation
    messages: MessageStorage,

    /// Mirror of the movement state
    is_moving: Arc<AtomicBool>,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: OrchestratorCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| CoachError::Channel(format!("Failed to send command: {}", e)))
    }

    /// Send a user message
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(OrchestratorCommand::SendText(text.into()))
    }

    /// Request motion permission and start sensing
    pub fn enable_motion(&self) -> Result<()> {
        self.send_command(OrchestratorCommand::EnableMotion)
    }

    /// Toggle voice output
    pub fn set_speech_enabled(&self, enabled: bool) -> Result<()> {
        self.send_command(OrchestratorCommand::SetSpeechEnabled(enabled))
    }

    /// Stop the orchestrator
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(OrchestratorCommand::Shutdown)
    }

    /// Try to receive an event from the orchestrator
    pub fn try_recv_event(&self) -> Option<OrchestratorEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get the event receiver
    pub fn event_receiver(&self) -> Receiver<OrchestratorEvent> {
        self.event_rx.clone()
    }

    /// Get the message log
    pub fn messages(&self) -> &MessageStorage {
        &self.messages
    }

    /// Check if the user is currently classified as moving
    pub fn is_moving(&self) -> bool {
        self.is_moving.load(Ordering::SeqCst)
    }
}

/// Result of one gateway call
struct Completion {
    request_id: Uuid,
    origin: MessageOrigin,
    elapsed_ms: u64,
    result: Result<ChatReply>,
}

/// Sampling, classification and dispatch state owned by the loop
struct CoachLoop {
    sampler: MotionSampler,
    classifier: MovementClassifier,
    tracker: StateTracker,
    dispatcher: Dispatcher,
}

impl CoachLoop {
    fn new(config: &CoachConfig) -> Self {
        Self {
            sampler: MotionSampler::new(),
            classifier: MovementClassifier::new(config.motion.clone()),
            tracker: StateTracker::new(&config.motion, 0),
            dispatcher: Dispatcher::new(config.dispatch.clone()),
        }
    }

    /// Run one sensor event through sampler, classifier and tracker
    fn on_sensor(&mut self, event: &SensorEvent, now_ms: u64) -> Option<TransitionEvent> {
        let sample = self.sampler.sample(event, now_ms)?;
        let verdict = self.classifier.classify(sample).verdict()?;
        self.tracker.apply(verdict, sample.timestamp_ms)
    }

    fn on_input(&mut self, input: DispatchInput) -> Option<CoachingPrompt> {
        self.dispatcher.dispatch(input, &self.tracker)
    }
}

/// Main orchestrator that owns the coaching loop
pub struct Orchestrator {
    config: CoachConfig,
    gateway: Arc<dyn ChatGateway>,
    voice: Voice,
    source: Arc<dyn SensorSource>,
    permission: Arc<dyn MotionPermission>,
    command_rx: mpsc::UnboundedReceiver<OrchestratorCommand>,
    event_tx: Sender<OrchestratorEvent>,
    messages: MessageStorage,
    is_moving: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given collaborators
    pub fn new(
        config: CoachConfig,
        gateway: Arc<dyn ChatGateway>,
        voice: Voice,
        source: Arc<dyn SensorSource>,
        permission: Arc<dyn MotionPermission>,
    ) -> Result<(Self, OrchestratorHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = unbounded();
        let messages = MessageStorage::new();
        let is_moving = Arc::new(AtomicBool::new(false));

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            messages: messages.clone(),
            is_moving: Arc::clone(&is_moving),
        };

        let orchestrator = Self {
            config,
            gateway,
            voice,
            source,
            permission,
            command_rx,
            event_tx,
            messages,
            is_moving,
        };

        Ok((orchestrator, handle))
    }

    /// Run the loop on the current runtime
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Run until shutdown or until every handle is dropped
    pub async fn run(mut self) -> Result<()> {
        info!("Orchestrator started");

        let clock = Instant::now();
        let now_ms = move || clock.elapsed().as_millis() as u64;

        let (sensor_tx, mut sensor_rx) = mpsc::unbounded_channel::<SensorEvent>();
        let mut coach = CoachLoop::new(&self.config);
        let mut subscription: Option<Subscription> = None;
        let mut in_flight: JoinSet<Completion> = JoinSet::new();
        let mut permission_requests: JoinSet<Result<PermissionState>> = JoinSet::new();

        if !self.permission.requires_permission() {
            subscription = Some(self.start_sensing(&mut coach, &sensor_tx));
        }

        let period = Duration::from_millis(self.config.dispatch.periodic_check_ms);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(OrchestratorCommand::SendText(text)) => {
                        self.submit_chat(&mut in_flight, text);
                    }
                    Some(OrchestratorCommand::EnableMotion) => {
                        if subscription.is_some() {
                            debug!("Motion already enabled");
                        } else if !permission_requests.is_empty() {
                            debug!("Motion permission request already pending");
                        } else {
                            let permission = Arc::clone(&self.permission);
                            permission_requests.spawn(async move { permission.request().await });
                            info!("Requesting motion permission");
                        }
                    }
                    Some(OrchestratorCommand::SetSpeechEnabled(enabled)) => {
                        self.voice.set_enabled(enabled);
                        info!("Speech {}", if enabled { "enabled" } else { "disabled" });
                        self.emit(OrchestratorEvent::SpeechToggled(enabled));
                    }
                    Some(OrchestratorCommand::Shutdown) => {
                        info!("Orchestrator shutdown requested");
                        break;
                    }
                    None => {
                        warn!("Command channel disconnected");
                        break;
                    }
                },

                Some(event) = sensor_rx.recv() => {
                    if let Some(transition) = coach.on_sensor(&event, now_ms()) {
                        info!(
                            "Movement {} -> {} at {}ms",
                            transition.from.as_str(),
                            transition.to.as_str(),
                            transition.at_ms
                        );
                        self.is_moving.store(coach.tracker.is_moving(), Ordering::SeqCst);
                        self.emit(OrchestratorEvent::Transition(transition));

                        if let Some(prompt) = coach.on_input(DispatchInput::Transition(transition)) {
                            self.submit_prompt(&mut in_flight, prompt);
                        }
                    }
                }

                _ = ticker.tick() => {
                    if coach.sampler.is_armed() {
                        let tick = DispatchInput::Tick { now_ms: now_ms() };
                        if let Some(prompt) = coach.on_input(tick) {
                            self.submit_prompt(&mut in_flight, prompt);
                        }
                    }
                }

                Some(joined) = permission_requests.join_next(), if !permission_requests.is_empty() => {
                    let outcome = joined
                        .map_err(|e| CoachError::Permission(format!("Request aborted: {}", e)))
                        .and_then(|result| result);
                    if subscription.is_none() {
                        subscription = self.on_permission(&mut coach, &sensor_tx, outcome);
                    }
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    match joined {
                        Ok(completion) => self.complete(completion),
                        Err(e) => warn!("Gateway task ended abnormally: {}", e),
                    }
                }
            }
        }

        // Teardown: listener first so no callback outlives the loop
        if let Some(subscription) = subscription.take() {
            subscription.unsubscribe();
        }
        coach.sampler.disarm();
        permission_requests.abort_all();
        in_flight.abort_all();
        self.voice.cancel();
        self.emit(OrchestratorEvent::Shutdown);

        info!("Orchestrator stopped");
        Ok(())
    }

    fn emit(&self, event: OrchestratorEvent) {
        let _ = self.event_tx.send(event);
    }

    fn start_sensing(
        &self,
        coach: &mut CoachLoop,
        sensor_tx: &mpsc::UnboundedSender<SensorEvent>,
    ) -> Subscription {
        coach.sampler.arm();

        let tx = sensor_tx.clone();
        let subscription = self.source.subscribe(Arc::new(move |event| {
            let _ = tx.send(event);
        }));

        info!("Motion sensing started");
        self.emit(OrchestratorEvent::MotionEnabled);
        subscription
    }

    /// Start sensing on a grant; otherwise report and keep running without motion
    fn on_permission(
        &self,
        coach: &mut CoachLoop,
        sensor_tx: &mpsc::UnboundedSender<SensorEvent>,
        outcome: Result<PermissionState>,
    ) -> Option<Subscription> {
        let error = match outcome {
            Ok(PermissionState::Granted) => return Some(self.start_sensing(coach, sensor_tx)),
            Ok(PermissionState::Denied) => {
                CoachError::Permission("Motion permission denied".to_string())
            }
            Err(e) => e,
        };

        warn!("Motion unavailable: {}", error);
        self.emit(OrchestratorEvent::PermissionDenied(error.user_message()));
        None
    }

    fn submit_chat(&self, in_flight: &mut JoinSet<Completion>, text: String) {
        let request = match ChatRequest::new(text) {
            Ok(request) => request,
            Err(e) => {
                debug!("Rejected chat message: {}", e);
                self.emit(OrchestratorEvent::InvalidMessage(e.user_message()));
                return;
            }
        };

        self.messages.add(Message::user(request.message.clone()));
        let request_id = self.submit(in_flight, request, MessageOrigin::Chat);
        self.emit(OrchestratorEvent::MessageSent { request_id });
    }

    fn submit_prompt(&self, in_flight: &mut JoinSet<Completion>, prompt: CoachingPrompt) {
        let request = ChatRequest {
            message: prompt.text.to_string(),
        };
        let request_id = self.submit(in_flight, request, MessageOrigin::Coaching(prompt.kind));
        info!("Dispatched {} ({})", prompt.kind.as_str(), request_id);
        self.emit(OrchestratorEvent::PromptDispatched {
            request_id,
            kind: prompt.kind,
        });
    }

    fn submit(
        &self,
        in_flight: &mut JoinSet<Completion>,
        request: ChatRequest,
        origin: MessageOrigin,
    ) -> Uuid {
        let request_id = Uuid::new_v4();
        let gateway = Arc::clone(&self.gateway);

        in_flight.spawn(async move {
            let start = Instant::now();
            let result = gateway.send(request).await;
            Completion {
                request_id,
                origin,
                elapsed_ms: start.elapsed().as_millis() as u64,
                result,
            }
        });

        request_id
    }

    fn complete(&self, completion: Completion) {
        let Completion {
            request_id,
            origin,
            elapsed_ms,
            result,
        } = completion;

        match result {
            Ok(ChatReply { reply }) => {
                debug!("Reply for {} after {}ms", request_id, elapsed_ms);
                self.messages.add(Message::assistant(reply.clone()).with_metadata(
                    MessageMetadata {
                        origin,
                        request_id: Some(request_id),
                        processing_time_ms: Some(elapsed_ms),
                    },
                ));
                let spoken = self.voice.speak(&reply);
                self.emit(OrchestratorEvent::Reply {
                    request_id,
                    origin,
                    text: reply,
                    spoken,
                });
            }
            Err(e) => {
                warn!("Dispatch {} dropped: {}", request_id, e);
                self.emit(OrchestratorEvent::DispatchFailed {
                    request_id,
                    origin,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Builder for creating an orchestrator
pub struct OrchestratorBuilder {
    config: CoachConfig,
    gateway: Option<Arc<dyn ChatGateway>>,
    voice: Option<Voice>,
    source: Option<Arc<dyn SensorSource>>,
    permission: Arc<dyn MotionPermission>,
}

impl OrchestratorBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CoachConfig::default(),
            gateway: None,
            voice: None,
            source: None,
            permission: Arc::new(NoPermissionGate),
        }
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: CoachConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the chat gateway
    pub fn with_gateway(mut self, gateway: Arc<dyn ChatGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the voice output; defaults to one built from the speech config
    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Set the sensor source
    pub fn with_source(mut self, source: Arc<dyn SensorSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the permission gate
    pub fn with_permission(mut self, permission: Arc<dyn MotionPermission>) -> Self {
        self.permission = permission;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<(Orchestrator, OrchestratorHandle)> {
        let gateway = self
            .gateway
            .ok_or_else(|| CoachError::Config("A chat gateway is required".to_string()))?;
        let source = self
            .source
            .ok_or_else(|| CoachError::Config("A sensor source is required".to_string()))?;
        let voice = self
            .voice
            .unwrap_or_else(|| Voice::from_config(&self.config.speech));

        Orchestrator::new(self.config, gateway, voice, source, self.permission)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::source::SensorHub;
    use async_trait::async_trait;

    struct EchoGateway;

    #[async_trait]
    impl ChatGateway for EchoGateway {
        async fn send(&self, request: ChatRequest) -> Result<ChatReply> {
            Ok(ChatReply {
                reply: format!("echo: {}", request.message),
            })
        }
    }

    #[test]
    fn test_builder_requires_gateway_and_source() {
        let result = OrchestratorBuilder::new()
            .with_source(Arc::new(SensorHub::new()))
            .build();
        assert!(matches!(result, Err(CoachError::Config(_))));

        let result = OrchestratorBuilder::new()
            .with_gateway(Arc::new(EchoGateway))
            .build();
        assert!(matches!(result, Err(CoachError::Config(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CoachConfig::default();
        config.dispatch.periodic_check_ms = 0;

        let result = OrchestratorBuilder::new()
            .with_config(config)
            .with_gateway(Arc::new(EchoGateway))
            .with_source(Arc::new(SensorHub::new()))
            .with_voice(Voice::silent())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_coach_loop_pipeline() {
        let mut coach = CoachLoop::new(&CoachConfig::default());

        // Disarmed sampler ignores everything
        assert!(coach.on_sensor(&SensorEvent::linear(0.0, 0.0, 9.0), 400).is_none());
        assert!(coach.classifier.previous().is_none());

        coach.sampler.arm();
        let mut transitions = Vec::new();
        for (i, z) in [0.0, 5.0, 0.0, 5.0].into_iter().enumerate() {
            let event = SensorEvent::linear(0.0, 0.0, z);
            transitions.extend(coach.on_sensor(&event, 1000 + i as u64 * 400));
        }

        assert_eq!(transitions.len(), 1);
        assert!(transitions[0].is_start());
        assert_eq!(
            coach.on_input(DispatchInput::Transition(transitions[0])).map(|p| p.kind),
            Some(PromptKind::StartedMoving)
        );
    }

    #[tokio::test]
    async fn test_handle_drop_stops_loop() {
        let hub = SensorHub::new();
        let (orchestrator, handle) = OrchestratorBuilder::new()
            .with_gateway(Arc::new(EchoGateway))
            .with_source(Arc::new(hub.clone()))
            .with_voice(Voice::silent())
            .build()
            .unwrap();

        let events = handle.event_receiver();
        let task = orchestrator.spawn();
        drop(handle);

        let result = tokio::time::timeout(Duration::from_secs(2), task).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
        assert_eq!(hub.listener_count(), 0);
        assert!(events.try_iter().any(|e| matches!(e, OrchestratorEvent::Shutdown)));
    }
}
