//! # Singleton
//!
//! One component value shared by every entity holding it.

use tessera_core::{Component, EcsResult, World};

struct NormalComponent(i32);
struct SingletonComponent(i32);

impl Component for NormalComponent {}
impl Component for SingletonComponent {}

fn main() -> EcsResult<()> {
    let mut world = World::builder()
        .with_sparse::<NormalComponent>()
        // The registration value is the shared one.
        .with_singleton(SingletonComponent(1))
        .build(8)?;

    // Values passed when attaching a singleton are discarded.
    let entity1 = world.add_entity((NormalComponent(1), SingletonComponent(0)))?;
    let entity2 = world.add_entity((NormalComponent(2), SingletonComponent(0)))?;

    // Holding is still explicit: this entity sees no singleton.
    let entity3 = world.add_entity(NormalComponent(3))?;
    println!("{}", world.entity(entity3)?.get::<SingletonComponent>()?.is_none()); // true

    {
        let first = world.entity(entity1)?.get::<SingletonComponent>()?;
        let second = world.entity(entity2)?.get::<SingletonComponent>()?;
        let same = match (&first, &second) {
            (Some(a), Some(b)) => std::ptr::eq(&**a, &**b),
            _ => false,
        };
        println!("{same}"); // true
    }

    if let Some(mut shared) = world.entity(entity1)?.get_mut::<SingletonComponent>()? {
        shared.0 = 2;
    }
    let seen = world.entity(entity2)?.get::<SingletonComponent>()?.map(|s| s.0);
    println!("{}", seen == Some(2)); // true

    Ok(())
}
