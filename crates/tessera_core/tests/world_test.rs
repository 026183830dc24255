//! Integration tests for entity lifecycle and component access.

use tessera_core::{Component, EcsError, Entity, StorageKind, View, World};

#[derive(Debug, Clone, Copy, PartialEq)]
struct C1(i32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct C2(i32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct C3(i32);
#[derive(Debug, Clone, PartialEq)]
struct Weather(&'static str);
#[derive(Debug, Clone, PartialEq)]
struct Tag(u64);

impl Component for C1 {}
impl Component for C2 {}
impl Component for C3 {}
impl Component for Weather {}
impl Component for Tag {}

fn dense_world() -> World {
    World::builder()
        .with_dense::<C1>()
        .with_dense::<C2>()
        .with_dense::<C3>()
        .build(16)
        .unwrap()
}

fn values(world: &World, entity: Entity) -> (bool, Option<i32>, Option<i32>) {
    let fetched = world.entity(entity).unwrap().fetch::<(C1, C2)>().unwrap();
    let (all, (c1, c2)) = fetched.into_parts();
    (all, c1.map(|c| c.0), c2.map(|c| c.0))
}

#[test]
fn test_end_to_end_fetch_and_rem() {
    let mut world = dense_world();
    let e1 = world.add_entity((C1(1), C2(2))).unwrap();
    let e2 = world.add_entity(C1(3)).unwrap();

    assert_eq!(values(&world, e1), (true, Some(1), Some(2)));
    assert_eq!(values(&world, e2), (false, Some(3), None));

    world.entity_mut(e1).unwrap().rem::<C2>().unwrap();
    assert_eq!(values(&world, e1), (false, Some(1), None));
}

#[test]
fn test_singleton_shared_between_entities() {
    let mut world = World::builder()
        .with_singleton(Weather("clear"))
        .with_dense::<C1>()
        .build(8)
        .unwrap();

    let a = world.add_entity((C1(0), Weather("ignored"))).unwrap();
    let b = world.add_entity(Weather("also ignored")).unwrap();

    assert_eq!(
        world.entity(b).unwrap().get::<Weather>().unwrap().as_deref(),
        Some(&Weather("clear"))
    );

    *world.entity(a).unwrap().get_mut::<Weather>().unwrap().unwrap() = Weather("storm");
    assert_eq!(
        world.entity(b).unwrap().get::<Weather>().unwrap().as_deref(),
        Some(&Weather("storm"))
    );

    // Overwriting through one holder leaves the shared value alone.
    world.entity_mut(b).unwrap().insert(Weather("sunny")).unwrap();
    assert_eq!(*world.singleton::<Weather>().unwrap().unwrap(), Weather("storm"));
}

#[test]
fn test_reused_slot_starts_empty() {
    let mut world = World::builder()
        .with_dense::<C1>()
        .with_sparse::<Tag>()
        .with_singleton(Weather("fog"))
        .build(4)
        .unwrap();

    let old = world.add_entity((C1(7), Tag(9), Weather("fog"))).unwrap();
    world.remove_entity(old).unwrap();
    let new = world.new_entity();
    assert_eq!(new.index(), old.index());

    let entity = world.entity(new).unwrap();
    assert!(entity.mask().is_empty());
    assert!(!entity.has::<C1>().unwrap());
    assert!(entity.get::<Tag>().unwrap().is_none());
    assert!(entity.get::<Weather>().unwrap().is_none());

    assert_eq!(world.entity(old).unwrap_err(), EcsError::StaleEntity(old));
}

#[test]
fn test_view_visits_exact_superset() {
    let mut world = dense_world();
    let mut expected = Vec::new();
    for i in 0..30 {
        let entity = world.new_entity();
        let mut access = world.entity_mut(entity).unwrap();
        if i % 2 == 0 {
            access.insert(C1(i)).unwrap();
        }
        if i % 3 == 0 {
            access.insert(C2(i)).unwrap();
        }
        if i % 5 == 0 {
            access.insert(C3(i)).unwrap();
        }
        if i % 6 == 0 {
            expected.push(entity);
        }
    }

    let view = View::new::<(C1, C2)>(&world).unwrap();
    let visited: Vec<_> = view.iter(&world).map(|e| e.id()).collect();
    assert_eq!(visited, expected);
}

#[test]
fn test_dense_growth_keeps_low_slots() {
    let mut world = World::builder().with_dense::<C1>().build(2).unwrap();
    let first = world.add_entity(C1(-1)).unwrap();
    let rest: Vec<_> = (0..100).map(|i| world.add_entity(C1(i)).unwrap()).collect();

    assert_eq!(*world.entity(first).unwrap().get::<C1>().unwrap().unwrap(), C1(-1));
    assert_eq!(*world.entity(rest[99]).unwrap().get::<C1>().unwrap().unwrap(), C1(99));
}

#[test]
fn test_sparse_component_on_few_entities() {
    let mut world = World::builder()
        .with_dense::<C1>()
        .with_component::<Tag>(StorageKind::Sparse)
        .build(64)
        .unwrap();

    let entities: Vec<_> = (0..64).map(|i| world.add_entity(C1(i)).unwrap()).collect();
    world.entity_mut(entities[63]).unwrap().insert(Tag(1)).unwrap();
    world.entity_mut(entities[10]).unwrap().insert(Tag(2)).unwrap();

    world.entity_mut(entities[63]).unwrap().rem::<Tag>().unwrap();
    world.entity_mut(entities[20]).unwrap().insert(Tag(3)).unwrap();

    assert_eq!(world.view::<Tag>().unwrap().count(&world), 2);
    assert_eq!(
        world.entity(entities[20]).unwrap().get::<Tag>().unwrap().as_deref(),
        Some(&Tag(3))
    );
    assert_eq!(
        world.entity(entities[10]).unwrap().get::<Tag>().unwrap().as_deref(),
        Some(&Tag(2))
    );
}

#[test]
fn test_unregistered_component_errors() {
    struct Unknown;
    impl Component for Unknown {}

    let mut world = dense_world();
    let entity = world.new_entity();
    assert!(matches!(
        world.entity(entity).unwrap().get::<Unknown>(),
        Err(EcsError::UnregisteredComponent { .. })
    ));
    assert!(View::new::<(C1, Unknown)>(&world).is_err());
    assert!(world.add_entity(Unknown).is_err());
    assert_eq!(world.len(), 1);
}
