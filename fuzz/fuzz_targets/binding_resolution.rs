#![no_main]

use flavor_di::{
    Annotations, Flavor, FlavorOptions, GuardPolicy, Inject, Injectable, Lateinit, Named, Scope,
    StaticDiscovery, TypeDescriptor,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

struct App;

#[derive(Default)]
struct Specimen {
    tagged: Lateinit<String>,
    plain: Lateinit<String>,
}

impl Injectable for Specimen {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Specimen>()
            .field::<String>("tagged", Annotations::of(Inject).and(Named::new("t0")), |p, v| {
                p.tagged.set(v)
            })
            .field::<String>("plain", Annotations::of(Inject), |p, v| p.plain.set(v))
            .constructor::<()>(|()| Ok(Specimen::default()))
            .build()
    }
}

// Each byte describes one binding: bit 0 guarded, bits 1-2 guard tag,
// bit 3 singleton-scoped. The resolved value must be the first eligible one.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let guards = if data[0] & 0x80 == 0 { GuardPolicy::Lenient } else { GuardPolicy::Strict };
    let options = FlavorOptions::new().guards(guards).log_lifecycle(false);
    let mut flavor = Flavor::with_options::<App>(StaticDiscovery::new(), options);

    let specs = &data[1..data.len().min(33)];
    for (index, byte) in specs.iter().enumerate() {
        let mut builder = flavor.bind::<String>();
        if byte & 1 == 1 {
            let tag = format!("t{}", (byte >> 1) & 0b11);
            builder = builder.annotated::<Named>(move |n| n.value() == tag);
        }
        if byte & 0b1000 != 0 {
            builder = builder.scoped(Scope::Singleton);
        }
        builder.to(format!("b{}", index));
    }

    let specimen = Arc::new(Specimen::default());
    let _ = flavor.inject(&specimen);

    let eligible = |needs_tag: bool| {
        specs.iter().position(|byte| {
            let unscoped = byte & 0b1000 == 0;
            let guard_ok = if byte & 1 == 0 {
                true
            } else if needs_tag {
                (byte >> 1) & 0b11 == 0
            } else {
                guards == GuardPolicy::Lenient
            };
            unscoped && guard_ok
        })
    };

    let tagged = specimen.tagged.get().map(|v| v.to_string());
    assert_eq!(tagged, eligible(true).map(|i| format!("b{}", i)));
    let plain = specimen.plain.get().map(|v| v.to_string());
    assert_eq!(plain, eligible(false).map(|i| format!("b{}", i)));
});
