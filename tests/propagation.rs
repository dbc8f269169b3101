use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use carryover::{
    holder::{AttachmentRef, ExistingTypes},
    prelude::*,
    propagation::{PropagationError, propagate_with_outcome, selectors},
    registry::{AttachmentRegistry, RegistryError},
};

#[derive(Debug, thiserror::Error)]
#[error("the {0} dimension is not loaded")]
struct DimensionNotLoaded(&'static str);

macro_rules! json_codec {
    ($ty:ty) => {
        FnCodec::<$ty>::new(
            |value: &$ty| Ok(serde_json::to_vec(value)?),
            |bytes: &[u8]| Ok(serde_json::from_slice(bytes)?),
        )
    };
}

fn counter(name: &'static str) -> AttachmentType<u32> {
    AttachmentType::builder(name)
        .codec(json_codec!(u32))
        .build()
}

struct Player {
    name: &'static str,
    attachments: AttachmentMap,
}

impl Player {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attachments: AttachmentMap::new(),
        }
    }
}

impl AttachmentHolder for Player {
    fn has_attachments(&self) -> bool {
        self.attachments.has_attachments()
    }

    fn existing_types(&self) -> ExistingTypes<'_> {
        self.attachments.existing_types()
    }

    fn get_attachment(&self, key: &AttachmentKey) -> Option<AttachmentRef<'_>> {
        self.attachments.get_attachment(key)
    }

    fn attachments_mut(&mut self) -> &mut AttachmentMap {
        &mut self.attachments
    }
}

#[test]
fn death_keeps_only_copy_on_death_types() {
    let soul: AttachmentType<u32> = AttachmentType::builder("magic:soul")
        .codec(json_codec!(u32))
        .copy_on_death()
        .build();
    let rage = counter("combat:rage");

    let mut dead = Player::new("Steve");
    dead.set_data(&soul, 1);
    dead.set_data(&rage, 2);

    let mut respawned = Player::new("Steve");
    copy_on_replacement(
        &CopyContext::empty(),
        &dead,
        &mut respawned,
        RemovalReason::Death,
    )
    .unwrap();

    assert_eq!(respawned.name, dead.name);
    assert_eq!(respawned.get_data(&soul), Some(&1));
    assert!(!respawned.has_data(&rage));

    // Nothing is taken from the source.
    assert_eq!(dead.get_data(&soul), Some(&1));
    assert_eq!(dead.get_data(&rage), Some(&2));
}

#[test]
fn transfer_keeps_every_transferable_type() {
    let soul: AttachmentType<u32> = AttachmentType::builder("magic:soul")
        .codec(json_codec!(u32))
        .copy_on_death()
        .build();
    let rage = counter("combat:rage");
    let target: AttachmentType<u32> = AttachmentType::builder("combat:target").build();

    let mut old = Player::new("Alex");
    old.set_data(&soul, 1);
    old.set_data(&rage, 2);
    old.set_data(&target, 3);

    let mut new = Player::new("Alex");
    copy_on_replacement(
        &CopyContext::empty(),
        &old,
        &mut new,
        RemovalReason::Transfer,
    )
    .unwrap();

    assert_eq!(new.get_data(&soul), Some(&1));
    assert_eq!(new.get_data(&rage), Some(&2));
    assert!(!new.has_data(&target));
}

#[test]
fn copies_are_independent() {
    let titles: AttachmentType<Vec<String>> = AttachmentType::builder("social:titles")
        .codec(json_codec!(Vec<String>))
        .build();

    let mut source = AttachmentMap::new();
    source.set_data(&titles, vec![String::from("Knight")]);
    let mut destination = AttachmentMap::new();

    copy_on_promotion(&CopyContext::empty(), &source, &mut destination).unwrap();

    source
        .get_data_mut(&titles)
        .unwrap()
        .push(String::from("Baron"));
    assert_eq!(destination.get_data(&titles).map(Vec::len), Some(1));

    destination.get_data_mut(&titles).unwrap().clear();
    assert_eq!(source.get_data(&titles).map(Vec::len), Some(2));
}

#[test]
fn unrelated_destination_state_is_preserved() {
    let carried = counter("test:carried");
    let resident = counter("test:resident");

    let mut source = AttachmentMap::new();
    source.set_data(&carried, 1);
    let mut destination = AttachmentMap::new();
    destination.set_data(&resident, 9);

    copy_on_promotion(&CopyContext::empty(), &source, &mut destination).unwrap();

    assert_eq!(destination.get_data(&carried), Some(&1));
    assert_eq!(destination.get_data(&resident), Some(&9));
}

#[test]
fn source_copy_overwrites_destination_value() {
    let level = counter("test:level");

    let mut source = AttachmentMap::new();
    source.set_data(&level, 30);
    let mut destination = AttachmentMap::new();
    destination.set_data(&level, 1);

    copy_on_promotion(&CopyContext::empty(), &source, &mut destination).unwrap();

    assert_eq!(destination.get_data(&level), Some(&30));
}

#[test]
fn handler_veto_skips_installation() {
    let quest: AttachmentType<u32> = AttachmentType::builder("quests:active")
        .codec(json_codec!(u32))
        .copy_handler(|_: &u32, _, _| Ok(None))
        .build();
    let kept = counter("quests:completed");

    let mut source = AttachmentMap::new();
    source.set_data(&quest, 4);
    source.set_data(&kept, 11);
    let mut destination = AttachmentMap::new();

    let outcome = propagate_with_outcome(
        &CopyContext::empty(),
        &source,
        &mut destination,
        selectors::unconditional(),
    )
    .unwrap();

    assert_eq!(outcome.vetoed, 1);
    assert_eq!(outcome.installed, 1);
    assert!(!destination.has_data(&quest));
    assert_eq!(destination.get_data(&kept), Some(&11));
}

#[test]
fn handler_can_inspect_destination() {
    let record: AttachmentType<u32> = AttachmentType::builder("stats:record")
        .codec(json_codec!(u32))
        .build();
    let handler_record = record.clone();
    let attempt: AttachmentType<u32> = AttachmentType::builder("stats:attempt")
        .codec(json_codec!(u32))
        .copy_handler(move |value: &u32, destination: &dyn AttachmentHolder, _| {
            match destination.get_data(&handler_record) {
                Some(record) if record < value => Ok(None),
                _ => Ok(Some(*value)),
            }
        })
        .build();

    let mut source = AttachmentMap::new();
    source.set_data(&attempt, 50);
    let mut beaten = AttachmentMap::new();
    beaten.set_data(&record, 40);
    let mut unbeaten = AttachmentMap::new();
    unbeaten.set_data(&record, 60);

    copy_on_promotion(&CopyContext::empty(), &source, &mut beaten).unwrap();
    copy_on_promotion(&CopyContext::empty(), &source, &mut unbeaten).unwrap();

    assert!(!beaten.has_data(&attempt));
    assert_eq!(unbeaten.get_data(&attempt), Some(&50));
}

#[test]
fn selector_rejects_types() {
    let kept = counter("test:kept");
    let dropped = counter("test:dropped");

    let mut source = AttachmentMap::new();
    source.set_data(&kept, 1);
    source.set_data(&dropped, 2);
    let mut destination = AttachmentMap::new();

    propagate(&CopyContext::empty(), &source, &mut destination, |ty| {
        !ty.is(&dropped)
    })
    .unwrap();

    assert_eq!(destination.get_data(&kept), Some(&1));
    assert!(!destination.has_data(&dropped));
}

/// A holder whose hidden attachments are listed after the visible ones, each
/// only while the shared flag is raised at the moment it is reached.
struct RevealingHolder {
    attachments: AttachmentMap,
    hidden: Vec<ErasedAttachmentType>,
    revealed: Arc<AtomicBool>,
}

impl AttachmentHolder for RevealingHolder {
    fn has_attachments(&self) -> bool {
        self.existing_types().next().is_some()
    }

    fn existing_types(&self) -> ExistingTypes<'_> {
        let visible = self
            .attachments
            .types()
            .filter(move |ty| !self.hidden.contains(ty));
        let hidden = self
            .hidden
            .iter()
            .filter(move |_| self.revealed.load(Ordering::SeqCst));
        ExistingTypes::new(visible.chain(hidden).cloned())
    }

    fn get_attachment(&self, key: &AttachmentKey) -> Option<AttachmentRef<'_>> {
        self.attachments.get_attachment(key)
    }

    fn attachments_mut(&mut self) -> &mut AttachmentMap {
        &mut self.attachments
    }
}

#[test]
fn types_added_during_a_call_are_not_propagated_by_it() {
    let trigger: AttachmentType<u32> = AttachmentType::builder("test:trigger")
        .codec(json_codec!(u32))
        .copy_handler(|value: &u32, _, context: &CopyContext<'_>| {
            context
                .require::<Arc<AtomicBool>>()?
                .store(true, Ordering::SeqCst);
            Ok(Some(*value))
        })
        .build();
    let late = counter("test:late");

    let revealed = Arc::new(AtomicBool::new(false));
    let mut source = RevealingHolder {
        attachments: AttachmentMap::new(),
        hidden: vec![late.erased()],
        revealed: revealed.clone(),
    };
    source.attachments.set_data(&trigger, 1);
    source.attachments.set_data(&late, 2);
    let context = CopyContext::new(&revealed);

    // Walking the listing lazily would reach `late` only after the trigger
    // handler raised the flag.
    let mut walked = source.existing_types();
    assert!(walked.next().is_some_and(|ty| ty.is(&trigger)));
    revealed.store(true, Ordering::SeqCst);
    assert!(walked.next().is_some_and(|ty| ty.is(&late)));
    drop(walked);
    revealed.store(false, Ordering::SeqCst);

    let mut destination = AttachmentMap::new();
    copy_on_promotion(&context, &source, &mut destination).unwrap();

    assert!(revealed.load(Ordering::SeqCst));
    assert_eq!(destination.get_data(&trigger), Some(&1));
    assert!(!destination.has_data(&late));

    let mut second = AttachmentMap::new();
    copy_on_promotion(&context, &source, &mut second).unwrap();
    assert_eq!(second.get_data(&late), Some(&2));
}

#[test]
fn failing_handler_aborts_and_keeps_earlier_copies() {
    let calls = Arc::new(AtomicUsize::new(0));

    let mut types = Vec::new();
    for name in ["test:a", "test:b", "test:c"] {
        let calls = calls.clone();
        let ty: AttachmentType<u32> = AttachmentType::builder(name)
            .codec(json_codec!(u32))
            .copy_handler(move |value: &u32, _, _| {
                if calls.fetch_add(1, Ordering::SeqCst) == 1 {
                    Err(DimensionNotLoaded("nether").into())
                } else {
                    Ok(Some(*value))
                }
            })
            .build();
        types.push(ty);
    }

    let mut source = AttachmentMap::new();
    for (value, ty) in types.iter().enumerate() {
        source.set_data(ty, value as u32);
    }
    let mut destination = AttachmentMap::new();

    let report = copy_on_promotion(&CopyContext::empty(), &source, &mut destination).unwrap_err();

    assert!(matches!(
        report.current_context(),
        PropagationError::CopyFailed { .. }
    ));
    assert_eq!(report.children().len(), 1);

    // The first handler ran and its copy stays, the third never ran.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(destination.len(), 1);
    let failed = types
        .iter()
        .find(|ty| ty.key() == report.current_context().key())
        .unwrap();
    assert!(!destination.has_data(failed));
}

#[test]
fn codec_round_trip_is_the_default_copy() {
    let profile: AttachmentType<serde_json::Value> = AttachmentType::builder("player:profile")
        .codec(json_codec!(serde_json::Value))
        .copy_on_death()
        .build();

    let mut source = AttachmentMap::new();
    source.set_data(
        &profile,
        serde_json::json!({ "class": "ranger", "skills": ["archery", "tracking"] }),
    );
    let mut destination = AttachmentMap::new();

    copy_on_replacement(
        &CopyContext::empty(),
        &source,
        &mut destination,
        RemovalReason::Conversion,
    )
    .unwrap();

    assert_eq!(destination.get_data(&profile), source.get_data(&profile));
}

#[test]
fn failing_codec_is_reported() {
    let broken: AttachmentType<u32> = AttachmentType::builder("test:broken")
        .codec(FnCodec::new(
            |value: &u32| Ok(value.to_le_bytes().to_vec()),
            |_: &[u8]| bail!("corrupted payload"),
        ))
        .build();

    let mut source = AttachmentMap::new();
    source.set_data(&broken, 5);
    let mut destination = AttachmentMap::new();

    let report = copy_on_promotion(&CopyContext::empty(), &source, &mut destination).unwrap_err();
    assert_eq!(report.current_context().key(), broken.key());
    assert!(destination.is_empty());
}

#[test]
fn works_through_trait_objects() {
    let rage = counter("combat:rage");
    let mut old = Player::new("Zombie");
    old.set_data(&rage, 3);
    let mut new = AttachmentMap::new();

    let source: &dyn AttachmentHolder = &old;
    let destination: &mut dyn AttachmentHolder = &mut new;
    copy_on_promotion(&CopyContext::empty(), source, destination).unwrap();

    assert_eq!(destination.get_data(&rage), Some(&3));
}

static REGISTRY: AttachmentRegistry = AttachmentRegistry::new();

#[test]
fn registry_in_a_static() {
    let mana = counter("registry:mana");
    let duplicate = counter("registry:mana");

    REGISTRY.register(&mana).unwrap();
    let report = REGISTRY.register(&duplicate).unwrap_err();
    assert!(matches!(
        report.current_context(),
        RegistryError::DuplicateKey { .. }
    ));

    let registered = REGISTRY.get("registry:mana").unwrap();
    assert!(registered.is(&mana));
    assert!(registered.has_codec());
}
