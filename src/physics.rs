//! Rigid-body world backed by rapier.
//!
//! Only the pieces the physics demo needs are exposed: a static floor, dynamic
//! balls, and a fixed-timestep stepping function.

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

/// Handle to a dynamic body created by [`PhysicsWorld::add_ball`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId(RigidBodyHandle);

/// Parameters of a dynamic sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallDesc {
    pub radius: f32,
    pub mass: f32,
    pub position: Vec3,
    pub linear_damping: f32,
    pub friction: f32,
    pub restitution: f32,
}

pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    accumulator: f32,
    steps_taken: u64,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            accumulator: 0.0,
            steps_taken: 0,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        to_vec3(&self.gravity)
    }

    /// Adds an infinite static floor whose surface is the plane `y = 0`.
    pub fn add_floor(&mut self, friction: f32, restitution: f32) {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .friction(friction)
            .restitution(restitution)
            .build();
        self.collider_set.insert(collider);
    }

    pub fn add_ball(&mut self, desc: BallDesc) -> BodyId {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(desc.position))
            .linear_damping(desc.linear_damping)
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::ball(desc.radius)
            .mass(desc.mass)
            .friction(desc.friction)
            .restitution(desc.restitution)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        BodyId(handle)
    }

    /// Advances the simulation by `elapsed` seconds in steps of `fixed_dt`.
    ///
    /// At most `max_substeps` steps run per call. When the cap is hit, the
    /// leftover time is reduced modulo `fixed_dt`, so whole steps that did
    /// not fit are dropped instead of replayed on later frames. Returns the
    /// number of steps taken.
    pub fn step(&mut self, fixed_dt: f32, elapsed: f32, max_substeps: u32) -> u32 {
        if fixed_dt <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed.max(0.0);
        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < max_substeps {
            self.step_once(fixed_dt);
            self.accumulator -= fixed_dt;
            substeps += 1;
        }
        if substeps == max_substeps {
            self.accumulator = self.accumulator.rem_euclid(fixed_dt);
        }
        substeps
    }

    fn step_once(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        self.steps_taken += 1;
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn position(&self, body: BodyId) -> Option<Vec3> {
        self.rigid_body_set
            .get(body.0)
            .map(|body| to_vec3(body.translation()))
    }

    pub fn rotation(&self, body: BodyId) -> Option<Quat> {
        self.rigid_body_set.get(body.0).map(|body| {
            let coords = body.rotation().coords;
            Quat::from_xyzw(coords.x, coords.y, coords.z, coords.w)
        })
    }

    pub fn velocity(&self, body: BodyId) -> Option<Vec3> {
        self.rigid_body_set
            .get(body.0)
            .map(|body| to_vec3(body.linvel()))
    }

    pub fn set_velocity(&mut self, body: BodyId, velocity: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(body.0) {
            body.set_linvel(to_vector(velocity), true);
        }
    }

    /// Teleports the body, keeping its velocity.
    pub fn set_position(&mut self, body: BodyId, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(body.0) {
            body.set_translation(to_vector(position), true);
        }
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}
