use std::time::{Duration, Instant};

use super::{Error, Result, Shutdown};
use crate::{
    config::TrackerConfig,
    control::{ActuationMapper, ControllerBank, Corrections},
    core::{Command, Observation},
    driver::CommandChannel,
    observer::Observer,
    vision::{overlay, Frame, FrameSource, TargetEstimator},
};

/// Tracking loop statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerStats {
    /// Completed cycles.
    pub cycles: u64,
    /// Cycles with a target observation.
    pub observed: u64,
    /// Cycles without a frame.
    pub missed_frames: u64,
    /// Commands which could not be sent.
    pub failed_commands: u64,
}

/// Closed tracking loop.
///
/// Each cycle acquires a frame, estimates the target, runs the controller
/// bank and sends the resulting command. Cycles run strictly one after
/// another and the controller state is only touched from within a cycle.
pub struct Tracker {
    bank: ControllerBank,
    mapper: ActuationMapper,
    source: Box<dyn FrameSource>,
    estimator: Box<dyn TargetEstimator>,
    observers: Vec<Box<dyn Observer>>,
    /// Fixed cycle period.
    interval: Option<Duration>,
    frame_timeout: Duration,
    slow_cycle: Duration,
    max_channel_failures: u32,
    stats: TrackerStats,
}

impl Tracker {
    pub fn new(
        bank: ControllerBank,
        source: Box<dyn FrameSource>,
        estimator: Box<dyn TargetEstimator>,
    ) -> Self {
        Self::from_parts(bank, source, estimator, &TrackerConfig::default())
    }

    fn from_parts(
        bank: ControllerBank,
        source: Box<dyn FrameSource>,
        estimator: Box<dyn TargetEstimator>,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            bank,
            mapper: ActuationMapper,
            source,
            estimator,
            observers: Vec::new(),
            interval: config.interval.map(Duration::from_millis),
            frame_timeout: Duration::from_millis(config.frame_timeout),
            slow_cycle: Duration::from_millis(config.slow_cycle),
            max_channel_failures: config.max_channel_failures.max(1),
            stats: TrackerStats::default(),
        }
    }

    /// Build the tracker and its controllers from configuration.
    pub fn from_config(
        config: &crate::Config,
        source: Box<dyn FrameSource>,
        estimator: Box<dyn TargetEstimator>,
    ) -> Result<Self> {
        config.validate()?;

        let bank = ControllerBank::from_config(
            &config.pid,
            config.tracker.frame_width,
            config.tracker.frame_height,
        )?
        .with_reset_after_lost(config.tracker.reset_after_lost);

        Ok(Self::from_parts(bank, source, estimator, &config.tracker))
    }

    /// Add an observer.
    pub fn add_observer<O: Observer + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn set_frame_timeout(&mut self, timeout: Duration) {
        self.frame_timeout = timeout;
    }

    pub fn set_max_channel_failures(&mut self, failures: u32) {
        self.max_channel_failures = failures.max(1);
    }

    #[inline]
    pub fn bank(&self) -> &ControllerBank {
        &self.bank
    }

    #[inline]
    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    /// Run the controllers on a frame and return the corrections.
    ///
    /// Without frame the cycle counts as a cycle without observation.
    pub fn process(&mut self, frame: Option<&Frame>) -> (Option<Observation>, Corrections) {
        let observation = frame.and_then(|frame| {
            self.estimator
                .detect(frame)
                .first()
                .map(Observation::from)
        });

        let corrections = self.bank.step(observation.as_ref());

        (observation, corrections)
    }

    /// Wait for the next frame. Returns `None` on shutdown.
    async fn acquire(&mut self, shutdown: &Shutdown) -> Option<Option<Frame>> {
        let timeout = self.frame_timeout;

        tokio::select! {
            _ = shutdown.wait() => None,
            frame = tokio::time::timeout(timeout, self.source.next_frame()) => {
                match frame {
                    Ok(Ok(frame)) => Some(Some(frame)),
                    Ok(Err(e)) => {
                        log::warn!("Failed to acquire frame: {}", e);
                        Some(None)
                    }
                    Err(_) => {
                        log::warn!("No frame within {} ms", timeout.as_millis());
                        Some(None)
                    }
                }
            }
        }
    }

    fn observe(
        &mut self,
        frame: Option<Frame>,
        observation: Option<&Observation>,
        corrections: &Corrections,
    ) {
        for observer in self.observers.iter_mut() {
            for (axis, correction) in corrections.iter() {
                observer.notify(axis, correction);
            }
        }

        let wants_frames = self.observers.iter().any(|observer| observer.wants_frames());
        if let (true, Some(mut frame), Some(observation)) = (wants_frames, frame, observation) {
            let point = (observation.center_x, observation.center_y);

            if let Some(detection) = frame.detections.first().copied() {
                overlay::rectangle(&mut frame, detection.bbox, overlay::MARKER_COLOR);
            }
            self.bank.draw(&mut frame, point);

            for observer in self.observers.iter_mut().filter(|o| o.wants_frames()) {
                observer.annotated(&frame);
            }
        }
    }

    /// Run the tracking loop until shutdown is requested.
    ///
    /// The shutdown token is checked at every cycle boundary and while
    /// waiting for a frame. On shutdown a neutral command is sent before
    /// returning. When commands keep failing the loop attempts a neutral
    /// command and gives up with `Error::ChannelFailure`.
    ///
    /// The slow cycle warning covers the whole cycle including the wait for
    /// the frame, but not the wait for the interval tick.
    pub async fn run(&mut self, channel: &mut dyn CommandChannel, shutdown: &Shutdown) -> Result {
        let mut interval = self.interval.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval
        });

        let mut failures = 0;

        log::debug!("Starting tracking loop");

        loop {
            if shutdown.is_triggered() {
                break;
            }

            if let Some(interval) = interval.as_mut() {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    _ = interval.tick() => {}
                }
            }

            let cycle_start = Instant::now();

            let Some(frame) = self.acquire(shutdown).await else {
                break;
            };

            if frame.is_none() {
                self.stats.missed_frames += 1;
            }

            let (observation, corrections) = self.process(frame.as_ref());
            if observation.is_some() {
                self.stats.observed += 1;
            }

            let command = self.mapper.map_corrections(&corrections);

            log::trace!("Cycle {}: {}", self.stats.cycles, command);

            match channel.send(command).await {
                Ok(()) => failures = 0,
                Err(e) => {
                    failures += 1;
                    self.stats.failed_commands += 1;

                    log::warn!("Failed to send command: {}", e);

                    if failures >= self.max_channel_failures {
                        log::error!("Command channel failed {} times in a row", failures);

                        if let Err(e) = channel.send(Command::NEUTRAL).await {
                            log::error!("Failed to send stop command: {}", e);
                        }

                        return Err(Error::ChannelFailure { attempts: failures });
                    }
                }
            }

            self.observe(frame, observation.as_ref(), &corrections);

            if cycle_start.elapsed() > self.slow_cycle {
                log::warn!("Cycle {} is delaying execution", self.stats.cycles);
            }

            self.stats.cycles += 1;
        }

        log::debug!("Tracking loop cancelled after {} cycles", self.stats.cycles);

        channel.send(Command::NEUTRAL).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        core::{Axis, Detection},
        driver::{Scene, SimVehicle, Vehicle, World},
        math::AxisController,
        vision::Upstream,
    };

    fn reference_bank() -> ControllerBank {
        ControllerBank::from_config(&crate::config::ControllerConfig::default(), 640, 480)
            .unwrap()
    }

    /// Frame source replaying a fixed list of frames, then stalling.
    struct Replay {
        frames: std::collections::VecDeque<Option<Frame>>,
    }

    impl Replay {
        fn new(targets: Vec<Option<(f32, f32, f32)>>) -> Self {
            let frames = targets
                .into_iter()
                .enumerate()
                .map(|(sequence, target)| {
                    let mut frame = Frame::new(sequence as u64, 640, 480);
                    if let Some((x, y, area)) = target {
                        let side = area.sqrt();
                        frame.detections.push(Detection {
                            center: (x, y),
                            bbox: (x - side / 2.0, y - side / 2.0, side, side),
                            score: 1.0,
                        });
                    }
                    Some(frame)
                })
                .collect();

            Self { frames }
        }
    }

    #[async_trait::async_trait]
    impl FrameSource for Replay {
        async fn next_frame(&mut self) -> Result<Frame> {
            match self.frames.pop_front() {
                Some(Some(frame)) => Ok(frame),
                _ => std::future::pending().await,
            }
        }
    }

    /// Records every command, fails on demand.
    ///
    /// Scripted outcomes are consumed first, `true` being a failure. Once
    /// the script runs out `fail` decides.
    #[derive(Default)]
    struct Recorder {
        commands: Vec<Command>,
        attempts: Vec<Command>,
        script: std::collections::VecDeque<bool>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl CommandChannel for Recorder {
        async fn send(&mut self, command: Command) -> Result {
            self.attempts.push(command);
            if self.script.pop_front().unwrap_or(self.fail) {
                return Err(Error::Disconnected);
            }
            self.commands.push(command);
            Ok(())
        }
    }

    struct Collector {
        samples: Arc<Mutex<Vec<(Axis, f32)>>>,
        frames: Arc<Mutex<Vec<Frame>>>,
    }

    impl Observer for Collector {
        fn notify(&mut self, axis: Axis, correction: f32) {
            self.samples.lock().unwrap().push((axis, correction));
        }

        fn wants_frames(&self) -> bool {
            true
        }

        fn annotated(&mut self, frame: &Frame) {
            self.frames.lock().unwrap().push(frame.clone());
        }
    }

    #[test]
    fn test_process_end_to_end() {
        let bank = ControllerBank::new(
            AxisController::new(0.22, 0.0, 0.1, 320.0).unwrap(),
            AxisController::new(0.27, 0.0, 0.1, 240.0).unwrap(),
            AxisController::new(0.005, 0.0, 0.003, 12_000.0).unwrap(),
        );
        let mut tracker = Tracker::new(
            bank,
            Box::new(Replay::new(vec![])),
            Box::new(Upstream::new(0.0)),
        );

        let mut frame = Frame::new(0, 640, 480);
        frame.detections.push(Detection {
            center: (420.0, 240.0),
            bbox: (370.0, 180.0, 100.0, 120.0),
            score: 1.0,
        });

        let (_, first) = tracker.process(Some(&frame));
        let (_, second) = tracker.process(Some(&frame));

        assert!((first.x + 22.0).abs() < 0.0001);
        assert!((second.x + 22.0).abs() < 0.0001);
        assert_eq!(first.y, 0.0);
        assert_eq!(first.z, 0.0);
    }

    #[test]
    fn test_process_without_frame() {
        let mut tracker = Tracker::new(
            reference_bank(),
            Box::new(Replay::new(vec![])),
            Box::new(Upstream::new(0.7)),
        );

        let (observation, corrections) = tracker.process(None);

        assert!(observation.is_none());
        assert_eq!(corrections, Corrections::NEUTRAL);
        assert_eq!(tracker.bank().lost(), 1);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let source = Replay::new(vec![
            Some((420.0, 300.0, 20_000.0)),
            None,
            None,
            Some((420.0, 300.0, 20_000.0)),
        ]);
        let mut tracker = Tracker::new(
            reference_bank(),
            Box::new(source),
            Box::new(Upstream::new(0.7)),
        );
        tracker.set_frame_timeout(Duration::from_millis(20));

        let samples = Arc::new(Mutex::new(Vec::new()));
        let frames = Arc::new(Mutex::new(Vec::new()));
        tracker.add_observer(Collector {
            samples: samples.clone(),
            frames: frames.clone(),
        });

        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.trigger();
        });

        let mut channel = Recorder::default();
        tracker.run(&mut channel, &shutdown).await.unwrap();

        let commands = &channel.commands;
        assert!(commands.len() >= 5);
        assert_eq!(commands[0], Command::new(0, -15, -16, 22));
        assert!(commands[1].is_neutral());
        assert!(commands[2].is_neutral());
        assert_eq!(commands[3], commands[0]);
        assert!(commands.last().unwrap().is_neutral());

        let stats = tracker.stats();
        assert_eq!(stats.observed, 2);
        assert!(stats.missed_frames >= 1);

        let samples = samples.lock().unwrap();
        assert_eq!(samples[0].0, Axis::X);
        assert_eq!(samples[1].0, Axis::Y);
        assert_eq!(samples[2].0, Axis::Z);
        assert_eq!(samples.len() as u64, stats.cycles * 3);

        // Only cycles with a target produce an annotated frame.
        assert_eq!(frames.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_channel_failure() {
        let source = Replay::new(vec![Some((320.0, 240.0, 12_000.0)); 10]);
        let mut tracker = Tracker::new(
            reference_bank(),
            Box::new(source),
            Box::new(Upstream::new(0.7)),
        );
        tracker.set_max_channel_failures(3);

        let mut channel = Recorder {
            fail: true,
            ..Default::default()
        };

        let result = tracker.run(&mut channel, &Shutdown::new()).await;

        assert!(matches!(result, Err(Error::ChannelFailure { attempts: 3 })));
        assert_eq!(tracker.stats().failed_commands, 3);
        assert_eq!(channel.attempts.len(), 4);
        assert_eq!(channel.attempts.last(), Some(&Command::NEUTRAL));
        assert!(channel.commands.is_empty());
    }

    #[tokio::test]
    async fn test_run_failure_count_resets() {
        // Target off center so every tracking command is non neutral.
        let source = Replay::new(vec![Some((420.0, 300.0, 20_000.0)); 10]);
        let mut tracker = Tracker::new(
            reference_bank(),
            Box::new(source),
            Box::new(Upstream::new(0.7)),
        );
        tracker.set_max_channel_failures(3);

        let mut channel = Recorder {
            script: [true, false, true, true].into_iter().collect(),
            fail: true,
            ..Default::default()
        };

        let result = tracker.run(&mut channel, &Shutdown::new()).await;

        assert!(matches!(result, Err(Error::ChannelFailure { attempts: 3 })));

        // One failure, one success, three failures and the stop attempt.
        let attempts = &channel.attempts;
        assert_eq!(attempts.len(), 6);
        assert!(attempts[..5].iter().all(|command| !command.is_neutral()));
        assert_eq!(attempts[5], Command::NEUTRAL);

        assert_eq!(channel.commands.len(), 1);
        assert!(!channel.commands[0].is_neutral());

        let stats = tracker.stats();
        assert_eq!(stats.failed_commands, 4);
        assert_eq!(stats.cycles, 4);
    }

    #[tokio::test]
    async fn test_run_cancelled_before_start() {
        let mut tracker = Tracker::new(
            reference_bank(),
            Box::new(Replay::new(vec![Some((320.0, 240.0, 12_000.0))])),
            Box::new(Upstream::new(0.7)),
        );

        let shutdown = Shutdown::new();
        shutdown.trigger();

        let mut channel = Recorder::default();
        tracker.run(&mut channel, &shutdown).await.unwrap();

        assert_eq!(tracker.stats().cycles, 0);
        assert_eq!(channel.commands, vec![Command::NEUTRAL]);
    }

    #[tokio::test]
    async fn test_closed_loop_converges() {
        let world = Arc::new(Mutex::new(World::new((420.0, 300.0), 20_000.0)));

        let mut vehicle = SimVehicle::new(world.clone());
        vehicle.connect().await.unwrap();
        vehicle.takeoff().await.unwrap();

        let scene = Scene::new(world.clone(), 640, 480).with_period(Duration::ZERO);
        let mut tracker = Tracker::new(
            reference_bank(),
            Box::new(scene),
            Box::new(Upstream::new(0.7)),
        );

        for _ in 0..300 {
            let frame = tracker.source.next_frame().await.unwrap();
            let (_, corrections) = tracker.process(Some(&frame));
            let command = tracker.mapper.map_corrections(&corrections);
            vehicle.send(command).await.unwrap();
        }

        let world = world.lock().unwrap();
        assert!((world.target.0 - 320.0).abs() < 10.0);
        assert!((world.target.1 - 240.0).abs() < 10.0);
        assert!((world.area - 12_000.0).abs() < 500.0);
    }
}
