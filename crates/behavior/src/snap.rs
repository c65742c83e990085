//! The snap behavior attached to a single entity.

use crate::candidates::CandidateSet;
use crate::grid::snap_to_grid;
use crate::surface::{nearest_hit, snap_ray, surface_pose, LastApplied, SurfacePose};
use glam::{Quat, Vec3};
use snapto_core::{
    Behavior, ConfigError, FrameTick, HookId, Intersection, ObjectId, RawOptions, SnapConfig,
    SnapHost, SnapMode,
};
use tracing::{debug, trace, warn};

/// Lifecycle state of a [`SnapTo`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, not yet activated.
    Inactive,
    /// Activated and reacting to triggers.
    Active,
    /// Deactivated; every trigger is ignored.
    Detached,
}

/// What a single snap cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapOutcome {
    /// The behavior is not active.
    Inactive,
    /// The configured mode is unrecognized.
    UnknownMode,
    /// Surface mode with nothing to cast against.
    NoCandidates,
    /// The ray hit nothing.
    Missed,
    /// Position set to a grid cell.
    Gridded(Vec3),
    /// Position set from a ray hit.
    Positioned(Vec3),
    /// Position and rotation set from a ray hit.
    Aligned {
        /// New local position.
        position: Vec3,
        /// New local rotation.
        rotation: Quat,
    },
}

impl SnapOutcome {
    /// Returns true when the entity transform was written.
    pub fn moved(&self) -> bool {
        matches!(
            self,
            SnapOutcome::Gridded(_) | SnapOutcome::Positioned(_) | SnapOutcome::Aligned { .. }
        )
    }
}

/// Declarative snapping for one entity.
///
/// On activation the entity's position is captured as the ray origin. The
/// behavior then snaps once (deferred until rendering starts if necessary)
/// or, in continuous mode, every frame.
#[derive(Debug)]
pub struct SnapTo {
    entity: ObjectId,
    config: SnapConfig,
    state: Lifecycle,
    origin: Vec3,
    candidates: CandidateSet,
    hits: Vec<Intersection>,
    last_applied: LastApplied,
    frame_hook: Option<HookId>,
    pending_render_start: Option<HookId>,
}

impl SnapTo {
    /// Attach a behavior to `entity` with an initial configuration.
    pub fn new(entity: ObjectId, config: SnapConfig) -> Self {
        Self {
            entity,
            config,
            state: Lifecycle::Inactive,
            origin: Vec3::ZERO,
            candidates: CandidateSet::new(),
            hits: Vec::new(),
            last_applied: LastApplied::default(),
            frame_hook: None,
            pending_render_start: None,
        }
    }

    /// Attach a behavior configured from raw options.
    pub fn from_options(entity: ObjectId, options: &RawOptions) -> Result<Self, ConfigError> {
        Ok(Self::new(entity, SnapConfig::from_options(options)?))
    }

    /// Entity this behavior positions.
    pub fn entity(&self) -> ObjectId {
        self.entity
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.state
    }

    /// Ray origin captured at activation.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Cached candidate set.
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Registered frame hook, if continuous.
    pub fn frame_hook(&self) -> Option<HookId> {
        self.frame_hook
    }

    /// Render-start listener still waiting to fire, if any.
    pub fn pending_render_start(&self) -> Option<HookId> {
        self.pending_render_start
    }

    /// Run one snap cycle now.
    pub fn snap<H: SnapHost + ?Sized>(&mut self, host: &mut H) -> SnapOutcome {
        if self.state != Lifecycle::Active {
            return SnapOutcome::Inactive;
        }

        let outcome = match self.config.mode {
            SnapMode::GridSnap { grid } => self.snap_to_grid(host, grid),
            SnapMode::SurfacePosition(_) | SnapMode::SurfaceNormalAlign { .. } => {
                self.snap_to_surface(host)
            }
            SnapMode::Unrecognized(_) => SnapOutcome::UnknownMode,
        };
        trace!(entity = %self.entity, mode = %self.config.mode, ?outcome, "snap cycle");
        outcome
    }

    fn snap_to_grid<H: SnapHost + ?Sized>(&mut self, host: &mut H, grid: Vec3) -> SnapOutcome {
        let Some(transform) = host.transform(self.entity) else {
            return SnapOutcome::Inactive;
        };
        let position = snap_to_grid(transform.position, grid, self.config.offset);
        host.set_position(self.entity, position);
        SnapOutcome::Gridded(position)
    }

    fn snap_to_surface<H: SnapHost + ?Sized>(&mut self, host: &mut H) -> SnapOutcome {
        let (ray_settings, align) = match &self.config.mode {
            SnapMode::SurfacePosition(ray) => (ray, None),
            SnapMode::SurfaceNormalAlign { ray, orientation } => {
                (ray, Some((*orientation, self.last_applied)))
            }
            _ => return SnapOutcome::UnknownMode,
        };

        let candidates = self
            .candidates
            .refresh(&*host, &ray_settings.objects, self.entity);
        if candidates.is_empty() {
            return SnapOutcome::NoCandidates;
        }

        let ray = snap_ray(self.origin, ray_settings);
        let Some(hit) = nearest_hit(&*host, &ray, candidates, &mut self.hits).copied() else {
            return SnapOutcome::Missed;
        };

        let current = host
            .transform(self.entity)
            .map_or(Quat::IDENTITY, |t| t.rotation);
        match surface_pose(&*host, &hit, self.config.offset, current, align) {
            SurfacePose::Position(position) => {
                host.set_position(self.entity, position);
                SnapOutcome::Positioned(position)
            }
            SurfacePose::Aligned { position, rotation } => {
                host.set_position(self.entity, position);
                host.set_rotation(self.entity, rotation);
                self.last_applied = LastApplied(rotation);
                SnapOutcome::Aligned { position, rotation }
            }
        }
    }

    /// Bring hooks in line with the continuous flag and, for one-shot mode,
    /// snap now or once rendering starts.
    fn schedule<H: SnapHost + ?Sized>(&mut self, host: &mut H) {
        if self.config.continuous {
            if let Some(pending) = self.pending_render_start.take() {
                host.remove_hook(pending);
            }
            if self.frame_hook.is_none() {
                self.frame_hook = Some(host.add_frame_hook(self.entity));
                debug!(entity = %self.entity, "registered per-frame snap");
            }
            return;
        }

        if let Some(hook) = self.frame_hook.take() {
            host.remove_hook(hook);
            debug!(entity = %self.entity, "removed per-frame snap");
        }

        if host.render_started() {
            self.snap(host);
        } else if self.pending_render_start.is_none() {
            self.pending_render_start = Some(host.once_render_start(self.entity));
            debug!(entity = %self.entity, "deferring snap until render start");
        }
    }
}

impl<H: SnapHost + ?Sized> Behavior<H> for SnapTo {
    fn on_activate(&mut self, host: &mut H) {
        if self.state != Lifecycle::Inactive {
            warn!(entity = %self.entity, state = ?self.state, "snap behavior activated twice");
            return;
        }

        self.origin = match host.transform(self.entity) {
            Some(transform) => transform.position,
            None => {
                warn!(entity = %self.entity, "activating snap on unknown entity");
                Vec3::ZERO
            }
        };
        self.candidates.invalidate();
        self.state = Lifecycle::Active;
        debug!(
            entity = %self.entity,
            mode = %self.config.mode,
            continuous = self.config.continuous,
            "snap behavior activated"
        );
        self.schedule(host);
    }

    fn on_config_change(&mut self, host: &mut H, options: &RawOptions) -> Result<(), ConfigError> {
        if self.state == Lifecycle::Detached {
            return Ok(());
        }

        let config = match SnapConfig::from_options(options) {
            Ok(config) => config,
            Err(err) => {
                warn!(entity = %self.entity, %err, "keeping previous snap configuration");
                return Err(err);
            }
        };

        self.config = config;
        self.candidates.invalidate();
        if self.state == Lifecycle::Active {
            self.schedule(host);
        }
        Ok(())
    }

    fn on_frame(&mut self, host: &mut H, _tick: FrameTick) {
        if self.frame_hook.is_some() {
            self.snap(host);
        }
    }

    fn on_render_start(&mut self, host: &mut H) {
        if self.pending_render_start.take().is_some() {
            self.snap(host);
        }
    }

    fn on_deactivate(&mut self, host: &mut H) {
        if let Some(hook) = self.frame_hook.take() {
            host.remove_hook(hook);
        }
        if let Some(pending) = self.pending_render_start.take() {
            host.remove_hook(pending);
        }
        self.state = Lifecycle::Detached;
        debug!(entity = %self.entity, "snap behavior detached");
    }
}
