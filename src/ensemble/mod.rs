pub mod fusion;
pub mod member;
pub mod skill;

pub use fusion::{EnsembleFusion, FusedEstimate, MemberWeight};
pub use member::{breakout_probability, Member, MemberContext, MemberEstimate};
pub use skill::SkillBook;
