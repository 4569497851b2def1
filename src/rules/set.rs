use crate::rules::{LinkContext, Rule};

/// The registered rules of a crawler
///
/// Follow and skip rules share one ordered list; a link is followed only if
/// every rule in it accepts the link. Match rules form a separate list; a link
/// is a match if any of them accepts it.
///
/// An empty follow/skip list accepts nothing, which disables recursion.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    follow: Vec<Rule>,
    matchers: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule a link must satisfy to be followed
    pub fn add_follow(&mut self, rule: Rule) {
        self.follow.push(rule);
    }

    /// Registers a rule a link must NOT satisfy to be followed
    pub fn add_skip(&mut self, rule: Rule) {
        self.follow.push(rule.negate());
    }

    /// Registers a rule that marks a link as a result
    pub fn add_match(&mut self, rule: Rule) {
        self.matchers.push(rule);
    }

    /// Decides whether a link should be followed
    pub fn should_follow(&self, ctx: &LinkContext<'_>) -> bool {
        !self.follow.is_empty() && self.follow.iter().all(|rule| rule.evaluate(ctx))
    }

    /// Decides whether a link is a match
    pub fn is_match(&self, ctx: &LinkContext<'_>) -> bool {
        self.matchers.iter().any(|rule| rule.evaluate(ctx))
    }

    /// Returns true if at least one follow or skip rule is registered
    pub fn can_recurse(&self) -> bool {
        !self.follow.is_empty()
    }

    pub fn follow_rules(&self) -> &[Rule] {
        &self.follow
    }

    pub fn match_rules(&self) -> &[Rule] {
        &self.matchers
    }
}
