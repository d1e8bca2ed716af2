//! Selections data model: the accumulating record of wizard choices.

use serde::{Deserialize, Serialize};

/// Category of website being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteType {
    Business,
    Portfolio,
    Blog,
    Ecommerce,
    Personal,
    Other,
}

impl std::fmt::Display for WebsiteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Business => "business",
            Self::Portfolio => "portfolio",
            Self::Blog => "blog",
            Self::Ecommerce => "ecommerce",
            Self::Personal => "personal",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Where the website's copy comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// The customer supplies their own text and images.
    UserProvided,
    /// Content is written for the customer.
    Generated,
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserProvided => write!(f, "user_provided"),
            Self::Generated => write!(f, "generated"),
        }
    }
}

/// Pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Basic,
    Standard,
    Premium,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Standard => write!(f, "standard"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

/// One slot of [`Selections`]. Used to report what is still missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Theme,
    WebsiteType,
    Description,
    ContentSource,
    DomainName,
    Plan,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Theme,
        Field::WebsiteType,
        Field::Description,
        Field::ContentSource,
        Field::DomainName,
        Field::Plan,
    ];

    /// Whether this slot holds a usable value. Blank strings do not count.
    pub fn is_filled(&self, selections: &Selections) -> bool {
        match self {
            Self::Theme => is_filled_text(&selections.theme),
            Self::WebsiteType => selections.website_type.is_some(),
            Self::Description => is_filled_text(&selections.description),
            Self::ContentSource => selections.content_source.is_some(),
            Self::DomainName => is_filled_text(&selections.domain_name),
            Self::Plan => selections.plan.is_some(),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Theme => "theme",
            Self::WebsiteType => "website_type",
            Self::Description => "description",
            Self::ContentSource => "content_source",
            Self::DomainName => "domain_name",
            Self::Plan => "plan",
        };
        write!(f, "{s}")
    }
}

fn is_filled_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// The partially-filled configuration for the website being built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_type: Option<WebsiteType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_source: Option<ContentSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

impl Selections {
    /// Merge a partial update. Slots left as `None` keep their current value.
    pub fn apply(&mut self, update: SelectionsUpdate) {
        if let Some(theme) = update.theme {
            self.theme = Some(theme);
        }
        if let Some(website_type) = update.website_type {
            self.website_type = Some(website_type);
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(content_source) = update.content_source {
            self.content_source = Some(content_source);
        }
        if let Some(domain_name) = update.domain_name {
            self.domain_name = Some(domain_name);
        }
        if let Some(plan) = update.plan {
            self.plan = Some(plan);
        }
    }

    /// Fields that still block submission, in stage order.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| !f.is_filled(self))
            .collect()
    }

    pub fn is_ready_for_submission(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Convert into the fully-populated form, or report what is missing.
    pub fn complete(&self) -> Result<CompleteSelections, Vec<Field>> {
        match (
            &self.theme,
            self.website_type,
            &self.description,
            self.content_source,
            &self.domain_name,
            self.plan,
        ) {
            (
                Some(theme),
                Some(website_type),
                Some(description),
                Some(content_source),
                Some(domain_name),
                Some(plan),
            ) if self.is_ready_for_submission() => Ok(CompleteSelections {
                theme: theme.trim().to_string(),
                website_type,
                description: description.trim().to_string(),
                content_source,
                domain_name: domain_name.trim().to_string(),
                plan,
            }),
            _ => Err(self.missing_fields()),
        }
    }
}

/// Typed partial update: one optional slot per field.
///
/// Unknown keys are rejected when deserializing, so a typo in a client
/// payload fails loudly instead of being dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_type: Option<WebsiteType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_source: Option<ContentSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

impl SelectionsUpdate {
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn website_type(mut self, website_type: WebsiteType) -> Self {
        self.website_type = Some(website_type);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn content_source(mut self, content_source: ContentSource) -> Self {
        self.content_source = Some(content_source);
        self
    }

    pub fn domain_name(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = Some(domain_name.into());
        self
    }

    pub fn plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }
}

/// Selections with every field present, ready to send to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteSelections {
    pub theme: String,
    pub website_type: WebsiteType,
    pub description: String,
    pub content_source: ContentSource,
    pub domain_name: String,
    pub plan: Plan,
}
