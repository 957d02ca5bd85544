use std::collections::HashMap;

use crate::config::EnsembleConfig;
use crate::ensemble::member::Member;
use crate::model::Horizon;

/// Per-(member, horizon) skill in [0, 1], updated by exponential smoothing.
#[derive(Debug, Clone)]
pub struct SkillBook {
    retain: f64,
    initial: f64,
    skills: HashMap<(Member, Horizon), f64>,
}

impl SkillBook {
    pub fn new(cfg: &EnsembleConfig) -> Self {
        Self {
            retain: cfg.skill_retain.clamp(0.0, 1.0),
            initial: cfg.initial_skill.clamp(0.0, 1.0),
            skills: HashMap::new(),
        }
    }

    pub fn get(&self, member: Member, horizon: Horizon) -> f64 {
        self.skills
            .get(&(member, horizon))
            .copied()
            .unwrap_or(self.initial)
    }

    /// `retain * old + (1 - retain) * accuracy`. Non-finite accuracy is
    /// ignored.
    pub fn update(&mut self, member: Member, horizon: Horizon, accuracy: f64) -> f64 {
        let old = self.get(member, horizon);
        if !accuracy.is_finite() {
            return old;
        }
        let next = (self.retain * old + (1.0 - self.retain) * accuracy.clamp(0.0, 1.0))
            .clamp(0.0, 1.0);
        self.skills.insert((member, horizon), next);
        next
    }

    pub fn reset(&mut self) {
        self.skills.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_pairs_read_initial_skill() {
        let book = SkillBook::new(&EnsembleConfig::default());
        assert_eq!(book.get(Member::Range, Horizon::H1), 0.5);
    }

    #[test]
    fn nan_accuracy_is_ignored() {
        let mut book = SkillBook::new(&EnsembleConfig::default());
        assert_eq!(book.update(Member::Breakout, Horizon::M5, f64::NAN), 0.5);
        assert_eq!(book.get(Member::Breakout, Horizon::M5), 0.5);
    }
}
