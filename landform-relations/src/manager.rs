//! The two-pass relations manager.
//!
//! The manager is generic over a [`ManagerPolicy`] that decides which
//! relations and members to keep and what to do once a relation is
//! complete. The base machinery here handles everything else: stashing,
//! member bookkeeping, ordering enforcement and output buffering.

use log::trace;

use landform_core::{
    Buffer, CallbackBuffer, Handler, HandlerError, ItemKind, ItemStash, Member, Node, OrderChecker,
    Relation, Way,
};

use crate::database::{RelationHandle, RelationsDatabase};
use crate::members::MembersDatabase;
use crate::util::{MemoryUsage, RelationsCollector};

/// Which entity kinds the second pass routes into the member databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest {
    pub nodes: bool,
    pub ways: bool,
    pub relations: bool,
}

impl Default for Interest {
    fn default() -> Self {
        Self {
            nodes: true,
            ways: true,
            relations: true,
        }
    }
}

impl Interest {
    /// Interest in way members only, the multipolygon configuration.
    pub fn only_ways() -> Self {
        Self {
            nodes: false,
            ways: true,
            relations: false,
        }
    }
}

/// Everything a policy may touch while completing a relation: the
/// assembled relation, lookup of its resolved members, and the output
/// buffer to write results into.
pub struct CompletionContext<'a> {
    pub relation: &'a Relation,
    stash: &'a ItemStash,
    pub buffer: &'a mut Buffer,
}

impl<'a> CompletionContext<'a> {
    /// The resolved node behind a member, if the member was satisfied.
    pub fn member_node(&self, member: &Member) -> Option<&'a Node> {
        member
            .handle
            .and_then(|handle| self.stash.get(handle).as_node())
    }

    /// The resolved way behind a member, if the member was satisfied.
    pub fn member_way(&self, member: &Member) -> Option<&'a Way> {
        member
            .handle
            .and_then(|handle| self.stash.get(handle).as_way())
    }

    /// The resolved relation behind a member, if the member was satisfied.
    pub fn member_relation(&self, member: &Member) -> Option<&'a Relation> {
        member
            .handle
            .and_then(|handle| self.stash.get(handle).as_relation())
    }

    /// All resolved way members, in member order.
    pub fn resolved_ways(&self) -> Vec<&'a Way> {
        self.relation
            .members
            .iter()
            .filter_map(|member| self.member_way(member))
            .collect()
    }
}

/// Decision points of a [`RelationsManager`].
///
/// `complete_relation` is the one required method. The keep/drop
/// predicates default to keeping everything, and the nine observers
/// default to doing nothing.
pub trait ManagerPolicy {
    /// First pass: should this relation be kept? Storing relations costs
    /// memory, so filter as early as possible.
    fn new_relation(&mut self, _relation: &Relation) -> bool {
        true
    }

    /// First pass, for each member of a kept relation: is this member
    /// interesting? Uninteresting members are recorded as such and never
    /// waited for.
    fn new_member(&mut self, _relation: &Relation, _member: &Member, _position: usize) -> bool {
        true
    }

    /// Second pass: the last interesting member of `ctx.relation` has
    /// arrived.
    fn complete_relation(&mut self, ctx: CompletionContext<'_>);

    /// Second pass, before member handling of a node.
    fn before_node(&mut self, _node: &Node) {}

    /// Second pass, for nodes no kept relation is waiting for.
    fn node_not_in_any_relation(&mut self, _node: &Node) {}

    /// Second pass, after member handling of a node.
    fn after_node(&mut self, _node: &Node) {}

    /// Second pass, before member handling of a way.
    fn before_way(&mut self, _way: &Way) {}

    /// Second pass, for ways no kept relation is waiting for.
    fn way_not_in_any_relation(&mut self, _way: &Way) {}

    /// Second pass, after member handling of a way.
    fn after_way(&mut self, _way: &Way) {}

    /// Second pass, before member handling of a relation.
    fn before_relation(&mut self, _relation: &Relation) {}

    /// Second pass, for relations no kept relation is waiting for.
    fn relation_not_in_any_relation(&mut self, _relation: &Relation) {}

    /// Second pass, after member handling of a relation.
    fn after_relation(&mut self, _relation: &Relation) {}
}

/// Orchestrates the two passes over an OSM entity stream.
///
/// Pass one sees relations only and records what to wait for. Between
/// the passes [`RelationsManager::prepare_for_lookup`] sorts the member
/// databases. Pass two streams all entities in canonical order; whenever
/// the last missing member of a relation arrives, the policy's
/// `complete_relation` runs and the relation's resources are released.
pub struct RelationsManager<P: ManagerPolicy> {
    policy: P,
    interest: Interest,
    stash: ItemStash,
    relations: RelationsDatabase,
    member_nodes: MembersDatabase<Node>,
    member_ways: MembersDatabase<Way>,
    member_relations: MembersDatabase<Relation>,
    output: CallbackBuffer,
    order: OrderChecker,
}

impl<P: ManagerPolicy> RelationsManager<P> {
    pub fn new(policy: P) -> Self {
        Self::with_interest(policy, Interest::default())
    }

    pub fn with_interest(policy: P, interest: Interest) -> Self {
        Self {
            policy,
            interest,
            stash: ItemStash::new(),
            relations: RelationsDatabase::new(),
            member_nodes: MembersDatabase::new(),
            member_ways: MembersDatabase::new(),
            member_relations: MembersDatabase::new(),
            output: CallbackBuffer::new(),
            order: OrderChecker::new(),
        }
    }

    /// Register the callback receiving flushed output buffers.
    pub fn set_callback(&mut self, callback: impl FnMut(Buffer) + 'static) {
        self.output.set_callback(callback);
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn into_policy(self) -> P {
        self.policy
    }

    /// Handler for the first pass; ignores everything but relations.
    pub fn first_pass_handler(&mut self) -> FirstPassHandler<'_, P> {
        FirstPassHandler { manager: self }
    }

    /// Handler for the second pass, with ordering enforcement.
    pub fn second_pass_handler(&mut self) -> SecondPassHandler<'_, P> {
        SecondPassHandler { manager: self }
    }

    /// Sort the member databases, making them ready for the second pass.
    pub fn prepare_for_lookup(&mut self) {
        self.member_nodes.prepare_for_lookup();
        self.member_ways.prepare_for_lookup();
        self.member_relations.prepare_for_lookup();
    }

    pub fn relations_db(&self) -> &RelationsDatabase {
        &self.relations
    }

    pub fn member_nodes_db(&self) -> &MembersDatabase<Node> {
        &self.member_nodes
    }

    pub fn member_ways_db(&self) -> &MembersDatabase<Way> {
        &self.member_ways
    }

    pub fn member_relations_db(&self) -> &MembersDatabase<Relation> {
        &self.member_relations
    }

    pub fn stash(&self) -> &ItemStash {
        &self.stash
    }

    /// Memory used by the manager's components.
    pub fn used_memory(&self) -> MemoryUsage {
        MemoryUsage {
            relations_db: self.relations.used_memory(),
            members_db: self.member_nodes.used_memory()
                + self.member_ways.used_memory()
                + self.member_relations.used_memory(),
            stash: self.stash.used_memory(),
        }
    }

    /// Mutable access to the output buffer.
    pub fn buffer(&mut self) -> &mut Buffer {
        self.output.buffer()
    }

    /// Drain the output buffer without involving the callback.
    pub fn read(&mut self) -> Buffer {
        self.output.take()
    }

    /// Push buffered output to the callback unconditionally.
    pub fn flush_output(&mut self) {
        self.output.flush();
    }

    fn add_relation(&mut self, relation: &Relation) {
        if !self.policy.new_relation(relation) {
            return;
        }
        let handle = self.relations.add(&mut self.stash, relation.clone());
        for (position, member) in relation.members.iter().enumerate() {
            if member.id != 0 && self.policy.new_member(relation, member, position) {
                match member.kind {
                    ItemKind::Node => {
                        self.member_nodes
                            .track(&mut self.relations, handle, member.id, position)
                    }
                    ItemKind::Way => {
                        self.member_ways
                            .track(&mut self.relations, handle, member.id, position)
                    }
                    ItemKind::Relation => {
                        self.member_relations
                            .track(&mut self.relations, handle, member.id, position)
                    }
                }
            } else {
                // Record "not interested" so later stages can skip the slot.
                self.relations
                    .relation_mut(&mut self.stash, handle)
                    .members[position]
                    .id = 0;
            }
        }
        trace!(
            "keeping relation {} with {} outstanding members",
            relation.id,
            self.relations.outstanding(handle)
        );
    }

    fn handle_node(&mut self, node: &Node) {
        self.policy.before_node(node);
        let mut completed = Vec::new();
        let added = self.member_nodes.add(
            node,
            &mut self.stash,
            &mut self.relations,
            |handle| completed.push(handle),
        );
        for handle in completed {
            self.finish_relation(handle);
        }
        if !added {
            self.policy.node_not_in_any_relation(node);
        }
        self.policy.after_node(node);
        self.output.possibly_flush();
    }

    fn handle_way(&mut self, way: &Way) {
        self.policy.before_way(way);
        let mut completed = Vec::new();
        let added = self.member_ways.add(
            way,
            &mut self.stash,
            &mut self.relations,
            |handle| completed.push(handle),
        );
        for handle in completed {
            self.finish_relation(handle);
        }
        if !added {
            self.policy.way_not_in_any_relation(way);
        }
        self.policy.after_way(way);
        self.output.possibly_flush();
    }

    fn handle_relation(&mut self, relation: &Relation) {
        self.policy.before_relation(relation);
        let mut completed = Vec::new();
        let added = self.member_relations.add(
            relation,
            &mut self.stash,
            &mut self.relations,
            |handle| completed.push(handle),
        );
        for handle in completed {
            self.finish_relation(handle);
        }
        if !added {
            self.policy.relation_not_in_any_relation(relation);
        }
        self.policy.after_relation(relation);
        self.output.possibly_flush();
    }

    fn finish_relation(&mut self, handle: RelationHandle) {
        {
            let relation = self.relations.relation(&self.stash, handle);
            trace!("relation {} complete", relation.id);
            let ctx = CompletionContext {
                relation,
                stash: &self.stash,
                buffer: self.output.buffer(),
            };
            self.policy.complete_relation(ctx);
        }
        self.output.possibly_flush();

        // Clear any record that would still deliver members to the
        // finished relation, then release its stash slots.
        let relation = self.relations.relation(&self.stash, handle);
        let relation_id = relation.id;
        let members: Vec<(ItemKind, i64)> = relation
            .members
            .iter()
            .filter(|member| member.id != 0)
            .map(|member| (member.kind, member.id))
            .collect();
        for (kind, member_id) in members {
            match kind {
                ItemKind::Node => {
                    self.member_nodes
                        .remove(&self.stash, &self.relations, member_id, relation_id)
                }
                ItemKind::Way => {
                    self.member_ways
                        .remove(&self.stash, &self.relations, member_id, relation_id)
                }
                ItemKind::Relation => {
                    self.member_relations
                        .remove(&self.stash, &self.relations, member_id, relation_id)
                }
            }
        }
        self.relations.remove(&mut self.stash, handle);
    }
}

impl<P: ManagerPolicy> RelationsCollector for RelationsManager<P> {
    fn collect_relation(&mut self, relation: &Relation) {
        self.add_relation(relation);
    }

    fn prepare_for_lookup(&mut self) {
        RelationsManager::prepare_for_lookup(self);
    }
}

/// First-pass view of a manager: consumes relations, ignores the rest.
pub struct FirstPassHandler<'a, P: ManagerPolicy> {
    manager: &'a mut RelationsManager<P>,
}

impl<P: ManagerPolicy> Handler for FirstPassHandler<'_, P> {
    fn relation(&mut self, relation: &Relation) -> Result<(), HandlerError> {
        self.manager.add_relation(relation);
        Ok(())
    }
}

/// Second-pass view of a manager: routes entities of interesting kinds
/// through the member databases, enforcing stream order.
pub struct SecondPassHandler<'a, P: ManagerPolicy> {
    manager: &'a mut RelationsManager<P>,
}

impl<P: ManagerPolicy> Handler for SecondPassHandler<'_, P> {
    fn node(&mut self, node: &Node) -> Result<(), HandlerError> {
        if self.manager.interest.nodes {
            self.manager.order.check(ItemKind::Node, node.id)?;
            self.manager.handle_node(node);
        }
        Ok(())
    }

    fn way(&mut self, way: &Way) -> Result<(), HandlerError> {
        if self.manager.interest.ways {
            self.manager.order.check(ItemKind::Way, way.id)?;
            self.manager.handle_way(way);
        }
        Ok(())
    }

    fn relation(&mut self, relation: &Relation) -> Result<(), HandlerError> {
        if self.manager.interest.relations {
            self.manager.order.check(ItemKind::Relation, relation.id)?;
            self.manager.handle_relation(relation);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), HandlerError> {
        self.manager.flush_output();
        Ok(())
    }
}
