//! Wizard stages and the sequencer that moves between them.

use serde::{Deserialize, Serialize};

use super::model::{Field, Selections};

/// The steps of the new-website wizard.
///
/// Progresses linearly: Theme → WebsiteType → Description → ContentSource →
/// Domain → Plan → Review.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Theme,
    WebsiteType,
    Description,
    ContentSource,
    Domain,
    Plan,
    Review,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Theme,
        Stage::WebsiteType,
        Stage::Description,
        Stage::ContentSource,
        Stage::Domain,
        Stage::Plan,
        Stage::Review,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Stage> {
        Self::ALL.get(index).copied()
    }

    /// Label shown on the step indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Theme => "Theme",
            Self::WebsiteType => "Website Type",
            Self::Description => "Website Description",
            Self::ContentSource => "Content Generation Type",
            Self::Domain => "Domain Finder",
            Self::Plan => "Plan (No Credit Card)",
            Self::Review => "Finish",
        }
    }

    /// The selection this stage is responsible for filling.
    pub fn owned_field(&self) -> Option<Field> {
        match self {
            Self::Theme => Some(Field::Theme),
            Self::WebsiteType => Some(Field::WebsiteType),
            Self::Description => Some(Field::Description),
            Self::ContentSource => Some(Field::ContentSource),
            Self::Domain => Some(Field::DomainName),
            Self::Plan => Some(Field::Plan),
            Self::Review => None,
        }
    }

    /// Whether the user may leave this stage going forward.
    pub fn precondition_met(&self, selections: &Selections) -> bool {
        self.owned_field()
            .is_some_and(|field| field.is_filled(selections))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Review)
    }

    pub fn next(&self) -> Option<Stage> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Stage> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Theme => "theme",
            Self::WebsiteType => "website_type",
            Self::Description => "description",
            Self::ContentSource => "content_source",
            Self::Domain => "domain",
            Self::Plan => "plan",
            Self::Review => "review",
        };
        write!(f, "{s}")
    }
}

/// Position of a stage relative to the active one, for the step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageProgress {
    Completed,
    Active,
    Upcoming,
}

/// One entry of the step indicator.
#[derive(Debug, Clone, Serialize)]
pub struct StageIndicator {
    pub stage: Stage,
    pub index: usize,
    pub label: &'static str,
    pub progress: StageProgress,
    /// Whether `jump_to` would accept this stage right now.
    pub can_jump: bool,
}

/// Tracks the active stage and gates movement between stages.
///
/// Forward movement is one stage at a time and only when the active stage's
/// precondition holds. Backward movement is free.
#[derive(Debug, Clone, Default)]
pub struct StageSequencer {
    active: Stage,
}

impl StageSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Stage {
        self.active
    }

    pub fn is_terminal(&self) -> bool {
        self.active.is_terminal()
    }

    pub fn can_advance(&self, selections: &Selections) -> bool {
        !self.active.is_terminal() && self.active.precondition_met(selections)
    }

    /// Move to the next stage if allowed. Returns whether the stage changed.
    pub fn advance(&mut self, selections: &Selections) -> bool {
        if !self.can_advance(selections) {
            return false;
        }
        match self.active.next() {
            Some(next) => {
                self.active = next;
                true
            }
            None => false,
        }
    }

    /// Step back one stage. No-op on the first stage.
    pub fn retreat(&mut self) -> bool {
        match self.active.previous() {
            Some(previous) => {
                self.active = previous;
                true
            }
            None => false,
        }
    }

    /// Whether `jump_to(target)` would be accepted.
    pub fn can_jump_to(&self, target: Stage) -> bool {
        target <= self.active
    }

    /// Jump directly to an earlier (or the current) stage. Forward jumps are
    /// refused. Returns whether the stage changed.
    pub fn jump_to(&mut self, target: Stage) -> bool {
        if !self.can_jump_to(target) || target == self.active {
            return false;
        }
        self.active = target;
        true
    }

    pub fn indicators(&self) -> Vec<StageIndicator> {
        Stage::ALL
            .into_iter()
            .map(|stage| StageIndicator {
                stage,
                index: stage.index(),
                label: stage.label(),
                progress: match stage.cmp(&self.active) {
                    std::cmp::Ordering::Less => StageProgress::Completed,
                    std::cmp::Ordering::Equal => StageProgress::Active,
                    std::cmp::Ordering::Greater => StageProgress::Upcoming,
                },
                can_jump: self.can_jump_to(stage),
            })
            .collect()
    }
}
