//! # Hello
//!
//! A system bound to two components, reading a third by hand.
//!
//! Prints how many entities the system visited on each of three ticks:
//! 1, then 2 after a second entity gains `Component2`, then 1 again after
//! it loses it.

use std::cell::Cell;
use std::rc::Rc;

use tessera_core::{Binder, Component, EcsResult, Required, System, SystemContext, World};

struct Component1(i32);
struct Component2(i32);
struct Component3(i32);

impl Component for Component1 {}
impl Component for Component2 {}
impl Component for Component3 {}

struct Accumulate {
    // Bindings are matched by type, field names are free.
    total: Required<Component1>,
    renamed: Required<Component2>,
    calls: Rc<Cell<u32>>,
}

impl System for Accumulate {
    fn run(&mut self, ctx: &SystemContext<'_>) -> EcsResult<()> {
        let step = ctx.read(self.renamed)?.0;
        let mut total = ctx.get(self.total)?;
        total.0 += step;

        // Unbound components can still be read through the entity.
        if let Some(extra) = ctx.entity().get::<Component3>()? {
            total.0 += extra.0;
        }

        self.calls.set(self.calls.get() + 1);
        Ok(())
    }
}

fn report(calls: &Cell<u32>) {
    println!("{}", calls.replace(0));
}

fn main() -> EcsResult<()> {
    // Capacity is a hint, the world grows past it.
    let mut world = World::builder()
        .with_sparse::<Component1>()
        .with_sparse::<Component2>()
        .with_sparse::<Component3>()
        .build(256)?;

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    world.add_system(move |b: &mut Binder<'_>| {
        Ok(Accumulate {
            total: b.required()?,
            renamed: b.required()?,
            calls: counter,
        })
    })?;

    world.add_entity((Component1(1), Component2(2), Component3(3)))?;

    let entity = world.new_entity();
    world.entity_mut(entity)?.set(Component1(0))?;

    world.update()?;
    report(&calls); // 1

    world.entity_mut(entity)?.set(Component2(5))?;
    world.update()?;
    report(&calls); // 2

    world.entity_mut(entity)?.rem::<Component2>()?;
    world.update()?;
    report(&calls); // 1

    Ok(())
}
