//! # View
//!
//! Iterating every entity that holds a set of components.

use tessera_core::{Component, EcsResult, View, World};

struct Component1(i32);
struct Component2(i32);

impl Component for Component1 {}
impl Component for Component2 {}

fn main() -> EcsResult<()> {
    let mut world = World::builder()
        .with_sparse::<Component1>()
        .with_sparse::<Component2>()
        .build(256)?;

    world.add_entity(Component1(1))?;
    world.add_entity((Component1(2), Component2(2)))?;

    let view = View::new::<(Component1, Component2)>(&world)?;
    view.each(&world, |entity| {
        // Every visited entity holds both.
        let (c1, c2) = entity.fetch::<(Component1, Component2)>()?.into_inner();
        if let (Some(c1), Some(c2)) = (c1, c2) {
            println!("{} {}", c1.0, c2.0);
        }
        Ok(())
    })
}
