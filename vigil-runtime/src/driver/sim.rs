use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{CommandChannel, Vehicle};
use crate::{
    core::{Command, Detection},
    runtime::{Error, Result},
    vision::{overlay, Frame, FrameSource},
};

/// Image displacement in pixels per frame per unit of yaw velocity.
const YAW_GAIN: f32 = 0.5;
/// Image displacement in pixels per frame per unit of vertical velocity.
const ALTITUDE_GAIN: f32 = 0.5;
/// Relative area change per frame per unit of forward velocity.
const APPROACH_GAIN: f32 = 0.002;

const TARGET_COLOR: [u8; 3] = [220, 180, 150];

/// Vehicle event as seen by the simulated vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Connect,
    StreamOn,
    StreamOff,
    Takeoff,
    Ascend(u16),
    Land,
    Command(Command),
}

/// Simulated world.
///
/// Holds the target as seen through the vehicle camera and the vehicle
/// state. Shared between the simulated vehicle and the simulated camera.
#[derive(Clone, Debug)]
pub struct World {
    /// Target center in pixels.
    pub target: (f32, f32),
    /// Target area in pixels.
    pub area: f32,
    /// Active remote control command.
    pub command: Command,
    pub connected: bool,
    pub streaming: bool,
    pub airborne: bool,
    /// Battery level in percent.
    pub battery: u8,
    /// Drop all commands as if the link went down.
    pub link_down: bool,
    /// Everything the vehicle received, in order.
    pub events: Vec<Event>,
}

impl World {
    pub fn new(target: (f32, f32), area: f32) -> Self {
        Self {
            target,
            area,
            command: Command::NEUTRAL,
            connected: false,
            streaming: false,
            airborne: false,
            battery: 100,
            link_down: false,
            events: Vec::new(),
        }
    }

    /// Advance the world by one frame with the active command.
    fn step(&mut self) {
        if !self.airborne {
            return;
        }

        let command = self.command;

        // Yawing right moves the target left in the image, climbing moves
        // it down and approaching makes it larger.
        self.target.0 -= command.yaw as f32 * YAW_GAIN;
        self.target.1 += command.up_down as f32 * ALTITUDE_GAIN;
        self.area *= 1.0 + command.forward_back as f32 * APPROACH_GAIN;
    }

    fn check_link(&self) -> Result {
        if self.link_down {
            Err(Error::Disconnected)
        } else {
            Ok(())
        }
    }
}

fn lock(world: &Mutex<World>) -> MutexGuard<'_, World> {
    world.lock().unwrap_or_else(|e| e.into_inner())
}

/// Simulated vehicle.
pub struct SimVehicle {
    world: Arc<Mutex<World>>,
}

impl SimVehicle {
    pub fn new(world: Arc<Mutex<World>>) -> Self {
        Self { world }
    }
}

#[async_trait::async_trait]
impl CommandChannel for SimVehicle {
    async fn send(&mut self, command: Command) -> Result {
        let mut world = lock(&self.world);
        world.check_link()?;
        if !world.connected {
            return Err(Error::Disconnected);
        }

        world.command = command;
        world.events.push(Event::Command(command));

        Ok(())
    }
}

#[async_trait::async_trait]
impl Vehicle for SimVehicle {
    async fn connect(&mut self) -> Result {
        let mut world = lock(&self.world);
        world.check_link()?;

        world.connected = true;
        world.events.push(Event::Connect);

        Ok(())
    }

    async fn battery(&mut self) -> Result<u8> {
        let world = lock(&self.world);
        world.check_link()?;

        Ok(world.battery)
    }

    async fn stream_on(&mut self) -> Result {
        let mut world = lock(&self.world);
        world.check_link()?;

        world.streaming = true;
        world.events.push(Event::StreamOn);

        Ok(())
    }

    async fn stream_off(&mut self) -> Result {
        let mut world = lock(&self.world);
        world.check_link()?;

        world.streaming = false;
        world.events.push(Event::StreamOff);

        Ok(())
    }

    async fn takeoff(&mut self) -> Result {
        let mut world = lock(&self.world);
        world.check_link()?;

        world.airborne = true;
        world.events.push(Event::Takeoff);

        Ok(())
    }

    async fn ascend(&mut self, distance: u16) -> Result {
        let mut world = lock(&self.world);
        world.check_link()?;

        world.events.push(Event::Ascend(distance));

        Ok(())
    }

    async fn land(&mut self) -> Result {
        let mut world = lock(&self.world);
        world.check_link()?;

        world.airborne = false;
        world.command = Command::NEUTRAL;
        world.events.push(Event::Land);

        Ok(())
    }
}

/// Simulated camera.
///
/// Produces one frame per period with the target detection attached. The
/// target is not detected once its center leaves the frame.
pub struct Scene {
    world: Arc<Mutex<World>>,
    width: u32,
    height: u32,
    period: Duration,
    jitter: bool,
    render: bool,
    rng: StdRng,
    sequence: u64,
}

impl Scene {
    pub fn new(world: Arc<Mutex<World>>, width: u32, height: u32) -> Self {
        Self {
            world,
            width,
            height,
            period: Duration::from_millis(33),
            jitter: false,
            render: false,
            rng: StdRng::from_entropy(),
            sequence: 0,
        }
    }

    /// Frame period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Let the target wander.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Produce pixel data.
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Seed the jitter generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn capture(&mut self) -> Frame {
        let mut world = lock(&self.world);
        world.step();

        if self.jitter {
            world.target.0 += self.rng.gen_range(-1.5..1.5);
            world.target.1 += self.rng.gen_range(-1.5..1.5);
            world.area *= 1.0 + self.rng.gen_range(-0.01..0.01);
        }

        let (x, y) = world.target;
        let area = world.area.max(0.0);
        drop(world);

        self.sequence += 1;

        let mut frame = if self.render {
            Frame::with_pixels(self.sequence, self.width, self.height)
        } else {
            Frame::new(self.sequence, self.width, self.height)
        };

        let visible = (0.0..self.width as f32).contains(&x) && (0.0..self.height as f32).contains(&y);
        if visible && area > 0.0 {
            let side = area.sqrt();
            let detection = Detection {
                center: (x, y),
                bbox: (x - side / 2.0, y - side / 2.0, side, side),
                score: 0.95,
            };

            if self.render {
                overlay::rectangle(&mut frame, detection.bbox, TARGET_COLOR);
            }

            frame.detections.push(detection);
        }

        frame
    }
}

#[async_trait::async_trait]
impl FrameSource for Scene {
    async fn next_frame(&mut self) -> Result<Frame> {
        if !self.period.is_zero() {
            tokio::time::sleep(self.period).await;
        }

        Ok(self.capture())
    }
}
