//! Lifecycle behaviour of the two-pass relations manager: completion
//! dispatch, ordering enforcement, duplicate members, hooks, telemetry
//! and output determinism.

use landform_core::{
    apply, AreaBuilder, Entity, HandlerError, ItemKind, Location, Member, Node, NodeRef,
    OrderError, Relation, VecReader, Way,
};
use landform_relations::{
    print_used_memory, read_relations, read_relations_with_progress, CompletionContext,
    ManagerPolicy, RelationsManager,
};

/// Keeps everything and records what the manager reports back.
#[derive(Debug, Default)]
struct RecordingPolicy {
    completed: Vec<i64>,
    resolved_member_counts: Vec<usize>,
    orphan_nodes: Vec<i64>,
    orphan_ways: Vec<i64>,
    before_ways: Vec<i64>,
    after_ways: Vec<i64>,
}

impl ManagerPolicy for RecordingPolicy {
    fn complete_relation(&mut self, ctx: CompletionContext<'_>) {
        self.completed.push(ctx.relation.id);
        self.resolved_member_counts.push(
            ctx.relation
                .members
                .iter()
                .filter(|member| member.handle.is_some())
                .count(),
        );
        ctx.buffer
            .push(AreaBuilder::from_relation(ctx.relation).finish());
    }

    fn node_not_in_any_relation(&mut self, node: &Node) {
        self.orphan_nodes.push(node.id);
    }

    fn way_not_in_any_relation(&mut self, way: &Way) {
        self.orphan_ways.push(way.id);
    }

    fn before_way(&mut self, way: &Way) {
        self.before_ways.push(way.id);
    }

    fn after_way(&mut self, way: &Way) {
        self.after_ways.push(way.id);
    }
}

fn node(id: i64) -> Node {
    Node::new(id, Location::new(id as i32, id as i32))
}

fn way(id: i64) -> Way {
    Way::new(id, vec![NodeRef::new(1), NodeRef::new(2)])
}

fn relation(id: i64, members: Vec<Member>) -> Relation {
    Relation::new(id, members)
}

fn member(kind: ItemKind, id: i64) -> Member {
    Member::new(kind, id, "")
}

fn first_pass<P: ManagerPolicy>(manager: &mut RelationsManager<P>, relations: Vec<Relation>) {
    let entities: Vec<Entity> = relations.into_iter().map(Entity::from).collect();
    apply(&entities, &mut manager.first_pass_handler()).expect("first pass cannot fail");
    manager.prepare_for_lookup();
}

#[test]
fn relation_completes_when_its_last_member_arrives() {
    let mut manager = RelationsManager::new(RecordingPolicy::default());
    first_pass(
        &mut manager,
        vec![relation(
            100,
            vec![member(ItemKind::Node, 5), member(ItemKind::Way, 7)],
        )],
    );

    let handle = manager
        .relations_db()
        .handles()
        .next()
        .expect("one kept relation");
    assert_eq!(manager.relations_db().outstanding(handle), 2);

    let stream = vec![
        Entity::from(node(4)),
        Entity::from(node(5)),
        Entity::from(way(7)),
    ];
    apply(&stream, &mut manager.second_pass_handler()).expect("ordered input");

    let policy = manager.policy();
    assert_eq!(policy.completed, vec![100]);
    assert_eq!(policy.resolved_member_counts, vec![2]);
    assert_eq!(policy.orphan_nodes, vec![4]);

    // Completion released the relation, its members and all records.
    assert!(manager.relations_db().is_empty());
    assert!(manager.stash().is_empty());
    assert_eq!(manager.member_nodes_db().pending(), 0);
    assert_eq!(manager.member_ways_db().pending(), 0);

    let areas = manager.read().into_areas();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].id, 201);
}

#[test]
fn duplicate_member_listing_completes_exactly_once() {
    let mut manager = RelationsManager::new(RecordingPolicy::default());
    first_pass(
        &mut manager,
        vec![relation(
            100,
            vec![member(ItemKind::Way, 7), member(ItemKind::Way, 7)],
        )],
    );

    let stream = vec![Entity::from(way(7))];
    apply(&stream, &mut manager.second_pass_handler()).expect("ordered input");

    let policy = manager.policy();
    assert_eq!(policy.completed, vec![100]);
    assert_eq!(policy.resolved_member_counts, vec![2]);

    // No dangling record remains after the post-completion purge.
    assert_eq!(manager.member_ways_db().pending(), 0);
    assert!(manager.stash().is_empty());
}

#[test]
fn uninteresting_members_are_recorded_as_ignored() {
    #[derive(Debug, Default)]
    struct WaysOnly(RecordingPolicy);

    impl ManagerPolicy for WaysOnly {
        fn new_member(&mut self, _relation: &Relation, member: &Member, _n: usize) -> bool {
            member.kind == ItemKind::Way
        }

        fn complete_relation(&mut self, ctx: CompletionContext<'_>) {
            self.0.complete_relation(ctx);
        }
    }

    let mut manager = RelationsManager::new(WaysOnly::default());
    first_pass(
        &mut manager,
        vec![relation(
            100,
            vec![member(ItemKind::Node, 5), member(ItemKind::Way, 7)],
        )],
    );

    let handle = manager
        .relations_db()
        .handles()
        .next()
        .expect("one kept relation");
    assert_eq!(manager.relations_db().outstanding(handle), 1);
    assert_eq!(manager.member_nodes_db().pending(), 0);

    // The stored copy has the ignored member's id zeroed out.
    let stored = manager
        .relations_db()
        .relation(manager.stash(), handle);
    assert_eq!(stored.members[0].id, 0);
    assert_eq!(stored.members[1].id, 7);

    let stream = vec![Entity::from(way(7))];
    apply(&stream, &mut manager.second_pass_handler()).expect("ordered input");
    assert_eq!(manager.policy().0.completed, vec![100]);
}

#[test]
fn second_pass_rejects_out_of_order_input() {
    let mut manager = RelationsManager::new(RecordingPolicy::default());
    first_pass(&mut manager, vec![relation(100, vec![])]);

    let stream = vec![Entity::from(way(7)), Entity::from(node(5))];
    let err = apply(&stream, &mut manager.second_pass_handler())
        .expect_err("nodes after ways violate the order");
    assert!(matches!(
        err,
        HandlerError::OutOfOrder(OrderError::KindRegression { .. })
    ));

    let stream = vec![Entity::from(node(9)), Entity::from(node(3))];
    let mut manager = RelationsManager::new(RecordingPolicy::default());
    first_pass(&mut manager, vec![relation(100, vec![])]);
    let err = apply(&stream, &mut manager.second_pass_handler())
        .expect_err("descending ids violate the order");
    assert!(matches!(
        err,
        HandlerError::OutOfOrder(OrderError::IdNotAscending { .. })
    ));
}

#[test]
fn hooks_fire_around_member_handling() {
    let mut manager = RelationsManager::new(RecordingPolicy::default());
    first_pass(
        &mut manager,
        vec![relation(100, vec![member(ItemKind::Way, 7)])],
    );

    let stream = vec![Entity::from(way(6)), Entity::from(way(7))];
    apply(&stream, &mut manager.second_pass_handler()).expect("ordered input");

    let policy = manager.policy();
    assert_eq!(policy.before_ways, vec![6, 7]);
    assert_eq!(policy.after_ways, vec![6, 7]);
    assert_eq!(policy.orphan_ways, vec![6]);
}

#[test]
fn read_relations_feeds_and_prepares_every_manager() {
    let mut first = RelationsManager::new(RecordingPolicy::default());
    let mut second = RelationsManager::new(RecordingPolicy::default());

    let entities = vec![
        Entity::from(node(1)),
        Entity::from(relation(100, vec![member(ItemKind::Way, 7)])),
        Entity::from(relation(101, vec![member(ItemKind::Way, 8)])),
    ];
    let mut reader = VecReader::with_batches(vec![entities]);
    read_relations(&mut reader, &mut [&mut first, &mut second]);

    assert_eq!(first.relations_db().count(), 2);
    assert_eq!(second.relations_db().count(), 2);

    // Lookup works immediately, so prepare_for_lookup has run.
    let stream = vec![Entity::from(way(7)), Entity::from(way(8))];
    apply(&stream, &mut first.second_pass_handler()).expect("ordered input");
    assert_eq!(first.policy().completed, vec![100, 101]);
}

#[test]
fn read_relations_reports_progress_per_batch() {
    let mut manager = RelationsManager::new(RecordingPolicy::default());
    let batches = vec![
        vec![Entity::from(relation(100, vec![]))],
        vec![Entity::from(relation(101, vec![]))],
    ];
    let mut reader = VecReader::with_batches(batches);

    let mut offsets = Vec::new();
    read_relations_with_progress(&mut reader, |offset| offsets.push(offset), &mut [&mut manager]);
    assert_eq!(offsets, vec![1, 2, 2]);
}

#[test]
fn second_pass_output_is_deterministic() {
    let run = || {
        let mut manager = RelationsManager::new(RecordingPolicy::default());
        first_pass(
            &mut manager,
            vec![
                relation(100, vec![member(ItemKind::Way, 7)]),
                relation(101, vec![member(ItemKind::Way, 7), member(ItemKind::Way, 9)]),
            ],
        );
        let stream = vec![Entity::from(way(7)), Entity::from(way(9))];
        apply(&stream, &mut manager.second_pass_handler()).expect("ordered input");
        manager.read().into_areas()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    // Completion order follows the arrival of each last missing member.
    assert_eq!(
        first.iter().map(|area| area.id).collect::<Vec<_>>(),
        vec![201, 203]
    );
}

#[test]
fn flush_callback_receives_buffered_areas() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let delivered = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&delivered);

    let mut manager = RelationsManager::new(RecordingPolicy::default());
    manager.set_callback(move |buffer| {
        sink.borrow_mut()
            .extend(buffer.into_areas().into_iter().map(|area| area.id));
    });
    first_pass(
        &mut manager,
        vec![relation(100, vec![member(ItemKind::Way, 7)])],
    );

    let stream = vec![Entity::from(way(7))];
    apply(&stream, &mut manager.second_pass_handler()).expect("ordered input");
    manager.flush_output();

    assert_eq!(*delivered.borrow(), vec![201]);
}

#[test]
fn memory_telemetry_covers_every_component() {
    let mut manager = RelationsManager::new(RecordingPolicy::default());
    first_pass(
        &mut manager,
        vec![relation(100, vec![member(ItemKind::Way, 7)])],
    );

    let usage = manager.used_memory();
    assert!(usage.relations_db > 0);
    assert!(usage.members_db > 0);
    assert!(usage.stash > 0);
    assert_eq!(
        usage.total(),
        usage.relations_db + usage.members_db + usage.stash
    );

    let mut out = Vec::new();
    print_used_memory(&mut out, &usage).expect("write to vec");
    let text = String::from_utf8(out).expect("utf-8");
    assert!(text.ends_with("  ======================\n"));
    assert_eq!(text.lines().count(), 5);
}
