use serde::Serialize;

use crate::config::EnsembleConfig;
use crate::ensemble::member::{breakout_probability, Member, MemberContext, MemberEstimate};
use crate::ensemble::skill::SkillBook;
use crate::model::Horizon;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemberWeight {
    pub member: Member,
    pub skill: f64,
    pub boost: f64,
    /// Normalized; weights across the panel sum to one.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedEstimate {
    pub mean: f64,
    pub variance: f64,
    pub confidence: f64,
    pub breakout_probability: f64,
    pub members: Vec<MemberEstimate>,
    pub weights: Vec<MemberWeight>,
}

impl FusedEstimate {
    pub fn std(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }

    pub fn weight_of(&self, member: Member) -> f64 {
        self.weights
            .iter()
            .find(|w| w.member == member)
            .map_or(0.0, |w| w.weight)
    }
}

/// Skill- and regime-weighted combination of the member panel.
#[derive(Debug, Clone)]
pub struct EnsembleFusion {
    boost_floor: f64,
    skills: SkillBook,
}

impl EnsembleFusion {
    pub fn new(cfg: EnsembleConfig) -> Self {
        Self {
            boost_floor: cfg.regime_boost_floor.max(0.0),
            skills: SkillBook::new(&cfg),
        }
    }

    pub fn skill(&self, member: Member, horizon: Horizon) -> f64 {
        self.skills.get(member, horizon)
    }

    pub fn update_skill(&mut self, member: Member, horizon: Horizon, accuracy: f64) -> f64 {
        let next = self.skills.update(member, horizon, accuracy);
        tracing::debug!(
            member = member.as_str(),
            horizon = %horizon,
            accuracy,
            skill = next,
            "ensemble skill updated"
        );
        next
    }

    pub fn reset_skills(&mut self) {
        self.skills.reset();
    }

    pub fn fuse(&self, ctx: &MemberContext<'_>) -> FusedEstimate {
        let members: Vec<MemberEstimate> = Member::ALL.iter().map(|m| m.predict(ctx)).collect();

        let mut weights: Vec<MemberWeight> = Member::ALL
            .iter()
            .map(|&member| {
                let skill = self.skills.get(member, ctx.horizon);
                let boost = self.boost_floor + ctx.belief.prob(member.target_regime());
                MemberWeight {
                    member,
                    skill,
                    boost,
                    weight: skill * boost,
                }
            })
            .collect();
        let total: f64 = weights.iter().map(|w| w.weight).sum();
        let uniform = 1.0 / weights.len() as f64;
        for w in &mut weights {
            w.weight = if total > f64::EPSILON && total.is_finite() {
                w.weight / total
            } else {
                uniform
            };
        }

        let mut mean = 0.0;
        let mut confidence = 0.0;
        for (est, w) in members.iter().zip(&weights) {
            mean += w.weight * est.mean;
            confidence += w.weight * est.confidence;
        }
        let variance = members
            .iter()
            .zip(&weights)
            .map(|(est, w)| {
                let dev = est.mean - mean;
                w.weight * (est.variance + dev * dev)
            })
            .sum();

        FusedEstimate {
            mean,
            variance,
            confidence: confidence.clamp(0.0, 1.0),
            breakout_probability: breakout_probability(ctx.features),
            members,
            weights,
        }
    }
}
