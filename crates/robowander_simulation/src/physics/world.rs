//! PhysicsWorld — headless 2D host поверх Rapier
//!
//! Архитектура:
//! - Rapier pipeline (rigid bodies + colliders + query pipeline) в одном Resource
//! - Тела агентов: dynamic ball, вращение залочено (поворотом управляет агент)
//! - Препятствия: fixed colliders (ball / cuboid) без rigid body
//! - Collision-enter: `CollisionEvent::Started` → ContactEvent с нормалью
//! - Попарный ignore через PhysicsHooks (filter_contact_pair)
//! - Импульсы копятся до следующего step (как ExternalImpulse в bevy_rapier)
//! - Deferred задачи (re-enable) по часам симуляции через Scheduler
//!
//! Тела агентов друг с другом не сталкиваются (collision groups), но видны
//! в raycast / overlap запросах как обычные коллайдеры.

use bevy::math::Rot2;
use bevy::prelude::*;
use rapier2d::na as nalgebra;
use rapier2d::parry::query;
use rapier2d::prelude::{
    point, vector, ActiveEvents, ActiveHooks, Ball, CCDSolver, ColliderBuilder, ColliderHandle,
    ColliderSet, CollisionEvent, ContactPair, DefaultBroadPhase, EventHandler, Group,
    ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager, Isometry,
    MultibodyJointSet, NarrowPhase, PairFilterContext, PhysicsHooks, PhysicsPipeline, QueryFilter,
    QueryPipeline, Ray, Real, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Rotation,
    SolverFlags, Vector,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::logger;
use crate::wander::{CollisionFilter, ColliderId, DeferredTask, PhysicsHost, RayHit};

use super::scheduler::Scheduler;

/// Запас для расчёта нормали нового контакта (solver уже вытолкнул тело)
const CONTACT_PREDICTION: Real = 0.1;

/// Группы: тела агентов ↔ препятствия, тела между собой не взаимодействуют
const BODY_GROUP: Group = Group::GROUP_1;
const OBSTACLE_GROUP: Group = Group::GROUP_2;

/// Форма статического препятствия
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Aabb { half_extents: Vec2 },
}

impl Shape {
    fn collider(&self) -> ColliderBuilder {
        match *self {
            Shape::Circle { radius } => ColliderBuilder::ball(radius),
            Shape::Aabb { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
        }
    }
}

/// Снимок состояния тела агента
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: Rot2,
}

/// Новый контакт за последний step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub body: ColliderId,
    pub other: ColliderId,
    /// От препятствия к телу
    pub normal: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct BodyHandles {
    rigid_body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Rapier hook: пары из ignored_pairs не получают контактов
struct IgnoredPairs<'a>(&'a BTreeSet<(ColliderId, ColliderId)>);

impl PhysicsHooks for IgnoredPairs<'_> {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let a = collider_id(&context.colliders[context.collider1]);
        let b = collider_id(&context.colliders[context.collider2]);

        if self.0.contains(&pair_key(a, b)) {
            None
        } else {
            Some(SolverFlags::COMPUTE_IMPULSES)
        }
    }
}

/// Rapier event handler: копим пары с CollisionEvent::Started
#[derive(Default)]
struct StartedContacts(Mutex<Vec<(ColliderHandle, ColliderHandle)>>);

impl EventHandler for StartedContacts {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if !event.started() {
            return;
        }

        if let Ok(mut started) = self.0.lock() {
            started.push((event.collider1(), event.collider2()));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

fn collider_id(collider: &rapier2d::prelude::Collider) -> ColliderId {
    ColliderId(collider.user_data as u32)
}

fn pair_key(a: ColliderId, b: ColliderId) -> (ColliderId, ColliderId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

#[derive(Resource)]
pub struct PhysicsWorld {
    elapsed: f32,
    next_id: u32,

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

    // BTreeMap/BTreeSet — детерминированный порядок обхода
    bodies: BTreeMap<ColliderId, BodyHandles>,
    obstacles: BTreeMap<ColliderId, ColliderHandle>,
    ignored_pairs: BTreeSet<(ColliderId, ColliderId)>,
    pending_impulses: BTreeMap<ColliderId, Vec2>,
    contacts: Vec<ContactEvent>,
    scheduler: Scheduler,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Пустой мир без гравитации (вид сверху)
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            next_id: 0,
            gravity: vector![0.0, 0.0],
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
            bodies: BTreeMap::new(),
            obstacles: BTreeMap::new(),
            ignored_pairs: BTreeSet::new(),
            pending_impulses: BTreeMap::new(),
            contacts: Vec::new(),
            scheduler: Scheduler::default(),
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed
    }

    fn allocate_id(&mut self) -> ColliderId {
        self.next_id += 1;
        ColliderId(self.next_id)
    }

    /// Добавить тело агента (ball, масса 1, без трения и отскока)
    pub fn add_body(&mut self, position: Vec2, radius: f32) -> ColliderId {
        let id = self.allocate_id();

        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y])
            .lock_rotations()
            .build();
        let rigid_body = self.rigid_body_set.insert(rigid_body);

        let collider = ColliderBuilder::ball(radius)
            .mass(1.0)
            .friction(0.0)
            .restitution(0.0)
            .collision_groups(InteractionGroups::new(BODY_GROUP, OBSTACLE_GROUP))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS)
            .user_data(id.0 as u128)
            .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, rigid_body, &mut self.rigid_body_set);

        self.bodies.insert(id, BodyHandles { rigid_body, collider });
        self.query_pipeline.update(&self.collider_set);
        id
    }

    pub fn add_obstacle(&mut self, position: Vec2, shape: Shape) -> ColliderId {
        let id = self.allocate_id();

        let collider = shape
            .collider()
            .translation(vector![position.x, position.y])
            .friction(0.0)
            .collision_groups(InteractionGroups::new(OBSTACLE_GROUP, BODY_GROUP))
            .user_data(id.0 as u128)
            .build();
        let handle = self.collider_set.insert(collider);

        self.obstacles.insert(id, handle);
        self.query_pipeline.update(&self.collider_set);
        id
    }

    /// Четыре стены вокруг прямоугольника [min, max] (внутренняя сторона — граница)
    pub fn add_room(&mut self, min: Vec2, max: Vec2, thickness: f32) -> Vec<ColliderId> {
        let half = thickness * 0.5;
        let center = (min + max) * 0.5;
        let size = max - min;

        let walls = [
            // left / right
            (Vec2::new(min.x - half, center.y), Vec2::new(half, size.y * 0.5 + thickness)),
            (Vec2::new(max.x + half, center.y), Vec2::new(half, size.y * 0.5 + thickness)),
            // bottom / top
            (Vec2::new(center.x, min.y - half), Vec2::new(size.x * 0.5 + thickness, half)),
            (Vec2::new(center.x, max.y + half), Vec2::new(size.x * 0.5 + thickness, half)),
        ];

        walls
            .into_iter()
            .map(|(position, half_extents)| self.add_obstacle(position, Shape::Aabb { half_extents }))
            .collect()
    }

    /// Удалить коллайдер. Отложенные задачи остаются в очереди и станут no-op.
    pub fn despawn(&mut self, id: ColliderId) -> bool {
        if let Some(handles) = self.bodies.remove(&id) {
            self.rigid_body_set.remove(
                handles.rigid_body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            self.pending_impulses.remove(&id);
        } else if let Some(handle) = self.obstacles.remove(&id) {
            self.collider_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                true,
            );
        } else {
            return false;
        }

        self.ignored_pairs.retain(|(a, b)| *a != id && *b != id);
        self.query_pipeline.update(&self.collider_set);
        true
    }

    pub fn body(&self, id: ColliderId) -> Option<BodyState> {
        let handles = self.bodies.get(&id)?;
        let rigid_body = self.rigid_body_set.get(handles.rigid_body)?;

        Some(BodyState {
            position: to_vec2(rigid_body.translation()),
            velocity: to_vec2(rigid_body.linvel()),
            rotation: Rot2::radians(rigid_body.rotation().angle()),
        })
    }

    pub fn set_body_velocity(&mut self, id: ColliderId, velocity: Vec2) {
        if let Some(rigid_body) = self
            .bodies
            .get(&id)
            .and_then(|handles| self.rigid_body_set.get_mut(handles.rigid_body))
        {
            rigid_body.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    pub fn set_body_rotation(&mut self, id: ColliderId, rotation: Rot2) {
        if let Some(rigid_body) = self
            .bodies
            .get(&id)
            .and_then(|handles| self.rigid_body_set.get_mut(handles.rigid_body))
        {
            rigid_body.set_rotation(Rotation::new(rotation.as_radians()), true);
        }
    }

    /// Импульс копится и применяется в начале следующего step
    pub fn apply_impulse(&mut self, id: ColliderId, impulse: Vec2) {
        if !self.bodies.contains_key(&id) {
            logger::log_warning(&format!("apply_impulse: body {:?} не найден", id));
            return;
        }

        *self.pending_impulses.entry(id).or_insert(Vec2::ZERO) += impulse;
    }

    pub fn is_collision_enabled(&self, a: ColliderId, b: ColliderId) -> bool {
        !self.ignored_pairs.contains(&pair_key(a, b))
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn schedule_after(&mut self, delay: f32, task: DeferredTask) {
        self.scheduler.schedule(self.elapsed, delay, task);
    }

    /// Per-agent view для state machine
    pub fn body_view(&mut self, body: ColliderId) -> BodyView<'_> {
        BodyView { world: self, body }
    }

    /// Забрать collision-enter контакты последнего step
    pub fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }

    fn handle_of(&self, id: ColliderId) -> Option<ColliderHandle> {
        self.bodies
            .get(&id)
            .map(|handles| handles.collider)
            .or_else(|| self.obstacles.get(&id).copied())
    }

    /// Ближайшее попадание луча (exclude — коллайдер, который луч игнорирует)
    ///
    /// Solid ray: старт внутри коллайдера даёт попадание на дистанции 0.
    pub fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        exclude: Option<ColliderId>,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        let ray = Ray::new(point![origin.x, origin.y], vector![direction.x, direction.y]);

        let mut filter = QueryFilter::default();
        if let Some(handle) = exclude.and_then(|id| self.handle_of(id)) {
            filter = filter.exclude_collider(handle);
        }

        let (handle, distance) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;

        let collider = self.collider_set.get(handle)?;
        Some(RayHit {
            distance,
            collider: collider_id(collider),
        })
    }

    /// Все коллайдеры, пересекающие круг (отсортированы по id)
    pub fn overlap_circle(&self, center: Vec2, radius: f32) -> Vec<ColliderId> {
        let mut result = Vec::new();

        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &Isometry::translation(center.x, center.y),
            &Ball::new(radius),
            QueryFilter::default(),
            |handle| {
                if let Some(collider) = self.collider_set.get(handle) {
                    result.push(collider_id(collider));
                }
                true
            },
        );

        result.sort();
        result
    }

    /// Один шаг физики: impulses → rapier step → новые контакты → deferred задачи
    pub fn step(&mut self, delta: f32) {
        if delta <= 0.0 {
            return;
        }

        self.elapsed += delta;
        self.integration_parameters.dt = delta;

        for (id, impulse) in std::mem::take(&mut self.pending_impulses) {
            if let Some(rigid_body) = self
                .bodies
                .get(&id)
                .and_then(|handles| self.rigid_body_set.get_mut(handles.rigid_body))
            {
                rigid_body.apply_impulse(vector![impulse.x, impulse.y], true);
            }
        }

        let hooks = IgnoredPairs(&self.ignored_pairs);
        let started = StartedContacts::default();

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
            &hooks,
            &started,
        );

        let started = started.0.into_inner().unwrap_or_default();
        let mut contacts: Vec<ContactEvent> = started
            .into_iter()
            .filter_map(|(a, b)| self.contact_event(a, b))
            .collect();
        contacts.sort_by_key(|contact| (contact.body, contact.other));
        self.contacts.extend(contacts);

        for task in self.scheduler.take_due(self.elapsed) {
            task.run(self);
        }
    }

    /// Пара (тело агента, препятствие) → ContactEvent, нормаль от препятствия к телу
    fn contact_event(&self, a: ColliderHandle, b: ColliderHandle) -> Option<ContactEvent> {
        let first = self.collider_set.get(a)?;
        let second = self.collider_set.get(b)?;

        let (body, other) = if self.bodies.contains_key(&collider_id(first)) {
            (first, second)
        } else {
            (second, first)
        };

        let normal = query::contact(
            other.position(),
            other.shape(),
            body.position(),
            body.shape(),
            CONTACT_PREDICTION,
        )
        .ok()
        .flatten()
        .map(|contact| to_vec2(&contact.normal1))
        .unwrap_or_else(|| {
            (to_vec2(body.translation()) - to_vec2(other.translation())).normalize_or_zero()
        });

        Some(ContactEvent {
            body: collider_id(body),
            other: collider_id(other),
            normal,
        })
    }
}

impl CollisionFilter for PhysicsWorld {
    fn collider_exists(&self, id: ColliderId) -> bool {
        self.bodies.contains_key(&id) || self.obstacles.contains_key(&id)
    }

    fn set_collision_enabled(&mut self, a: ColliderId, b: ColliderId, enabled: bool) {
        let key = pair_key(a, b);
        if enabled {
            self.ignored_pairs.remove(&key);
        } else {
            self.ignored_pairs.insert(key);
        }
    }
}

/// PhysicsHost для одного тела агента
pub struct BodyView<'a> {
    world: &'a mut PhysicsWorld,
    body: ColliderId,
}

impl CollisionFilter for BodyView<'_> {
    fn collider_exists(&self, id: ColliderId) -> bool {
        self.world.collider_exists(id)
    }

    fn set_collision_enabled(&mut self, a: ColliderId, b: ColliderId, enabled: bool) {
        self.world.set_collision_enabled(a, b, enabled);
    }
}

impl PhysicsHost for BodyView<'_> {
    fn elapsed_secs(&self) -> f32 {
        self.world.elapsed
    }

    fn position(&self) -> Vec2 {
        self.world
            .body(self.body)
            .map_or(Vec2::ZERO, |body| body.position)
    }

    fn rotation(&self) -> Rot2 {
        self.world
            .body(self.body)
            .map_or(Rot2::IDENTITY, |body| body.rotation)
    }

    fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.world.set_body_velocity(self.body, velocity);
    }

    fn set_rotation(&mut self, rotation: Rot2) {
        self.world.set_body_rotation(self.body, rotation);
    }

    fn apply_impulse(&mut self, impulse: Vec2) {
        self.world.apply_impulse(self.body, impulse);
    }

    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        self.world
            .raycast(origin, direction, max_distance, Some(self.body))
    }

    fn overlap_circle(&self, center: Vec2, radius: f32) -> Vec<ColliderId> {
        self.world.overlap_circle(center, radius)
    }

    fn schedule_after(&mut self, delay: f32, task: DeferredTask) {
        self.world.schedule_after(delay, task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wander::CancelToken;

    const EPS: f32 = 1e-3;
    const DT: f32 = 1.0 / 60.0;

    /// Тело в (0, 0), стена справа на x ∈ [1, 2]
    fn world_with_wall() -> (PhysicsWorld, ColliderId, ColliderId) {
        let mut world = PhysicsWorld::new();
        let body = world.add_body(Vec2::ZERO, 0.25);
        let wall = world.add_obstacle(
            Vec2::new(1.5, 0.0),
            Shape::Aabb { half_extents: Vec2::new(0.5, 5.0) },
        );
        (world, body, wall)
    }

    fn position(world: &PhysicsWorld, body: ColliderId) -> Vec2 {
        world.body(body).map_or(Vec2::ZERO, |b| b.position)
    }

    #[test]
    fn test_raycast_hits_wall_and_excludes_self() {
        let (world, body, wall) = world_with_wall();

        let hit = world.raycast(Vec2::ZERO, Vec2::X, 2.0, Some(body));
        assert_eq!(hit.map(|h| h.collider), Some(wall));
        assert!((hit.map_or(0.0, |h| h.distance) - 1.0).abs() < EPS);

        // Без exclude луч стартует внутри тела
        let hit = world.raycast(Vec2::ZERO, Vec2::X, 2.0, None);
        assert_eq!(hit.map(|h| h.collider), Some(body));
        assert!(hit.map_or(1.0, |h| h.distance).abs() < EPS);

        assert!(world.raycast(Vec2::ZERO, Vec2::NEG_X, 2.0, Some(body)).is_none());
        assert!(world.raycast(Vec2::ZERO, Vec2::X, 0.5, Some(body)).is_none());
    }

    #[test]
    fn test_overlap_includes_self_and_nearby_wall() {
        let (world, body, wall) = world_with_wall();
        assert_eq!(world.overlap_circle(Vec2::ZERO, 1.0), vec![body, wall]);
        assert_eq!(world.overlap_circle(Vec2::ZERO, 0.5), vec![body]);
    }

    #[test]
    fn test_collision_enter_reported_once_with_normal() {
        let (mut world, body, wall) = world_with_wall();
        world.set_body_velocity(body, Vec2::new(2.0, 0.0));

        let mut contacts = Vec::new();
        for _ in 0..60 {
            world.step(DT);
            contacts.extend(world.drain_contacts());
        }

        assert_eq!(contacts.len(), 1, "contacts = {:?}", contacts);
        assert_eq!(contacts[0].body, body);
        assert_eq!(contacts[0].other, wall);
        assert!((contacts[0].normal - Vec2::NEG_X).length() < EPS);

        // Тело не проходит сквозь стену
        let x = position(&world, body).x;
        assert!(x <= 0.75 + 0.01, "x = {}", x);
    }

    #[test]
    fn test_ignored_pair_does_not_collide() {
        let (mut world, body, wall) = world_with_wall();
        world.set_collision_enabled(body, wall, false);
        assert!(!world.is_collision_enabled(wall, body));

        world.set_body_velocity(body, Vec2::new(2.0, 0.0));
        for _ in 0..30 {
            world.step(DT);
        }

        assert!(world.drain_contacts().is_empty());
        assert!(position(&world, body).x > 0.9);
    }

    #[test]
    fn test_bodies_pass_through_each_other() {
        let mut world = PhysicsWorld::new();
        let first = world.add_body(Vec2::ZERO, 0.25);
        let second = world.add_body(Vec2::new(1.0, 0.0), 0.25);
        world.set_body_velocity(first, Vec2::new(3.0, 0.0));

        for _ in 0..30 {
            world.step(DT);
        }

        assert!(world.drain_contacts().is_empty());
        assert!(position(&world, first).x > 1.4);
        // Но запросы видят оба тела
        assert_eq!(
            world.raycast(Vec2::new(-1.0, 0.0), Vec2::X, 5.0, Some(first)).map(|h| h.collider),
            Some(second)
        );
    }

    #[test]
    fn test_impulse_applied_on_next_step() {
        let (mut world, body, _) = world_with_wall();
        world.body_view(body).apply_impulse(Vec2::new(0.0, 3.0));
        assert_eq!(world.body(body).map(|b| b.velocity), Some(Vec2::ZERO));

        // Нулевая velocity до step не гасит накопленный импульс
        world.body_view(body).set_linear_velocity(Vec2::ZERO);
        world.step(0.1);

        let state = world.body(body).expect("body");
        assert!((state.velocity - Vec2::new(0.0, 3.0)).length() < EPS);
        assert!((state.position.y - 0.3).abs() < EPS);
    }

    #[test]
    fn test_rotation_set_by_view() {
        let (mut world, body, _) = world_with_wall();
        world.body_view(body).set_rotation(Rot2::radians(1.0));
        world.step(DT);

        let angle = world.body_view(body).rotation().as_radians();
        assert!((angle - 1.0).abs() < EPS, "angle = {}", angle);
    }

    #[test]
    fn test_deferred_reenable_fires_after_delay() {
        let (mut world, body, wall) = world_with_wall();
        world.set_collision_enabled(body, wall, false);
        world.body_view(body).schedule_after(
            0.5,
            DeferredTask::ReEnableCollision {
                agent: body,
                other: wall,
                token: CancelToken::new(),
            },
        );

        world.step(0.25);
        assert!(!world.is_collision_enabled(body, wall));
        assert_eq!(world.pending_tasks(), 1);

        world.step(0.25);
        assert!(world.is_collision_enabled(body, wall));
        assert_eq!(world.pending_tasks(), 0);
    }

    #[test]
    fn test_deferred_reenable_after_despawn_is_noop() {
        let (mut world, body, wall) = world_with_wall();
        world.set_collision_enabled(body, wall, false);
        world.schedule_after(
            0.5,
            DeferredTask::ReEnableCollision {
                agent: body,
                other: wall,
                token: CancelToken::new(),
            },
        );

        assert!(world.despawn(wall));
        assert!(!world.collider_exists(wall));
        assert!(world.raycast(Vec2::ZERO, Vec2::X, 2.0, Some(body)).is_none());

        world.step(1.0);
        assert_eq!(world.pending_tasks(), 0);
        assert!(world.body(body).is_some());
    }

    #[test]
    fn test_room_keeps_body_inside() {
        let mut world = PhysicsWorld::new();
        let walls = world.add_room(Vec2::splat(-2.0), Vec2::splat(2.0), 0.5);
        assert_eq!(walls.len(), 4);

        let body = world.add_body(Vec2::ZERO, 0.25);
        world.set_body_velocity(body, Vec2::new(3.0, 1.0));

        let mut contacts = Vec::new();
        for _ in 0..120 {
            world.step(DT);
            contacts.extend(world.drain_contacts());
        }

        let p = position(&world, body);
        assert!(p.x <= 1.75 + 0.01 && p.y <= 1.75 + 0.01, "position = {:?}", p);
        assert!(!contacts.is_empty());
    }
}
