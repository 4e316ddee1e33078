//! The multipolygon specialisation of the relations manager.

use landform_core::{ItemKind, Member, Relation};
use landform_relations::{CompletionContext, Interest, ManagerPolicy, RelationsManager};

use crate::assembler::Assembler;
use crate::problem::Problem;

/// Manager policy that keeps multipolygon (and boundary) relations,
/// waits for their way members and assembles an area on completion.
///
/// # Examples
/// ```
/// use landform_area::MultipolygonPolicy;
///
/// let manager = MultipolygonPolicy::new().into_manager();
/// assert!(manager.relations_db().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MultipolygonPolicy {
    assembler: Assembler,
}

/// A relations manager driven by the [`MultipolygonPolicy`].
pub type MultipolygonManager = RelationsManager<MultipolygonPolicy>;

impl MultipolygonPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable problem collection on the underlying assembler.
    pub fn with_problem_collection() -> Self {
        let mut policy = Self::new();
        policy.assembler.remember_problems(true);
        policy
    }

    /// The geometric problems collected so far.
    pub fn problems(&self) -> &[Problem] {
        self.assembler.problems()
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    pub fn assembler_mut(&mut self) -> &mut Assembler {
        &mut self.assembler
    }

    /// Wrap this policy in a manager interested in way members only.
    pub fn into_manager(self) -> MultipolygonManager {
        RelationsManager::with_interest(self, Interest::only_ways())
    }
}

impl ManagerPolicy for MultipolygonPolicy {
    fn new_relation(&mut self, relation: &Relation) -> bool {
        matches!(
            relation.tags.get("type"),
            Some("multipolygon") | Some("boundary")
        )
    }

    fn new_member(&mut self, _relation: &Relation, member: &Member, _position: usize) -> bool {
        member.kind == ItemKind::Way
    }

    fn complete_relation(&mut self, ctx: CompletionContext<'_>) {
        let ways = ctx.resolved_ways();
        self.assembler.assemble(ctx.relation, &ways, ctx.buffer);
    }
}
