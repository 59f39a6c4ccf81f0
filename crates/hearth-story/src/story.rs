//! Story records
//!
//! A [`Story`] is the display-ready rendering of one activity, or of a bundle
//! of basic-income mints. Its [`StoryContent`] is a linked chain: each link
//! names its actors and a description, and may point at the next link (a new
//! member pointing at their inviter, a gift pointing at its recipient).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use hearth_core::{MemberId, Operation, OperationId, ProjectionError};
use serde::{Deserialize, Serialize};

use crate::activity::Activity;

/// Longest chain a story may carry, counting the head link
pub const MAX_CHAIN_DEPTH: usize = 4;

/// What a story is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryKind {
    NewMember,
    Give,
    MintBasicIncome,
    TrustMember,
    VerifyMember,
    RequestVerification,
    EditMember,
    FlagMember,
}

/// How a chain link relates to the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainDirection {
    /// This link acts on the next (a gift flowing to its recipient)
    Forward,
    /// Both links took part (a new member and the member who brought them in)
    Bidirectional,
    /// The links are related without either acting on the other
    NonDirectional,
}

/// How an amount should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencyRole {
    Transaction,
    Donation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyValue {
    pub value: BigDecimal,
    pub role: CurrencyRole,
}

/// One fragment of a description line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DescriptionPiece {
    Text(String),
    Currency(CurrencyValue),
}

impl DescriptionPiece {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn currency(value: BigDecimal, role: CurrencyRole) -> Self {
        Self::Currency(CurrencyValue { value, role })
    }
}

/// A video with its thumbnail image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    pub video_uri: String,
    pub thumbnail_uri: String,
}

impl VideoReference {
    /// Reference a video whose thumbnail sits next to it
    pub fn for_uri(video_uri: String) -> Self {
        let thumbnail_uri = format!("{}.thumb.jpg", video_uri);
        Self {
            video_uri,
            thumbnail_uri,
        }
    }
}

/// Optional payload displayed under a description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryBody {
    Media(Vec<VideoReference>),
    Text(String),
    /// Bundled basic income: per-minter totals plus the bundle total
    MintBasicIncome {
        minted: Vec<(MemberId, BigDecimal)>,
        total: BigDecimal,
    },
    /// Trust granted, as (truster, trusted)
    TrustMember(Vec<(MemberId, MemberId)>),
}

/// Who a chain link is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actors {
    Members(Vec<MemberId>),
    BasicIncomePool,
}

impl Actors {
    pub fn member(id: MemberId) -> Self {
        Self::Members(vec![id])
    }

    /// Add a member, keeping first-appearance order without repeats.
    /// The pool has no member list; pushing onto it does nothing.
    pub fn push(&mut self, id: MemberId) {
        if let Self::Members(members) = self {
            if !members.contains(&id) {
                members.push(id);
            }
        }
    }

    pub fn members(&self) -> &[MemberId] {
        match self {
            Self::Members(members) => members,
            Self::BasicIncomePool => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextInChain {
    pub direction: ChainDirection,
    pub next_content: Box<StoryContent>,
}

/// One link of a story chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryContent {
    pub actors: Actors,
    pub description: Vec<DescriptionPiece>,
    pub body: Option<StoryBody>,
    pub next: Option<NextInChain>,
}

impl StoryContent {
    pub fn new(actors: Actors, description: Vec<DescriptionPiece>) -> Self {
        Self {
            actors,
            description,
            body: None,
            next: None,
        }
    }

    pub fn with_body(mut self, body: StoryBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Append `next` at the tail of this chain
    pub fn chain_to(
        self,
        direction: ChainDirection,
        next: StoryContent,
    ) -> Result<Self, ProjectionError> {
        if self.chain_depth() + next.chain_depth() > MAX_CHAIN_DEPTH {
            return Err(ProjectionError::ChainTooDeep {
                max: MAX_CHAIN_DEPTH,
            });
        }

        Ok(self.append_tail(direction, next))
    }

    fn append_tail(mut self, direction: ChainDirection, next: StoryContent) -> Self {
        self.next = Some(match self.next.take() {
            None => NextInChain {
                direction,
                next_content: Box::new(next),
            },
            Some(link) => NextInChain {
                direction: link.direction,
                next_content: Box::new(link.next_content.append_tail(direction, next)),
            },
        });
        self
    }

    /// Number of links, counting this one
    pub fn chain_depth(&self) -> usize {
        self.links().count()
    }

    /// Walk the chain from this link to its tail
    pub fn links(&self) -> impl Iterator<Item = &StoryContent> {
        std::iter::successors(Some(self), |link| {
            link.next.as_ref().map(|next| next.next_content.as_ref())
        })
    }

    /// Concatenated description, amounts at their recorded scale
    pub fn description_text(&self) -> String {
        self.description
            .iter()
            .map(|piece| match piece {
                DescriptionPiece::Text(text) => text.clone(),
                DescriptionPiece::Currency(currency) => currency.value.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Stable story identifier derived from its kind and operations
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    pub fn derive<'a>(
        kind: StoryKind,
        operations: impl IntoIterator<Item = &'a OperationId>,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.name().as_bytes());
        for id in operations {
            hasher.update(b"\x00");
            hasher.update(id.as_bytes());
        }
        Self(hex::encode(&hasher.finalize().as_bytes()[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl StoryKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMember => "NEW_MEMBER",
            Self::Give => "GIVE",
            Self::MintBasicIncome => "MINT_BASIC_INCOME",
            Self::TrustMember => "TRUST_MEMBER",
            Self::VerifyMember => "VERIFY_MEMBER",
            Self::RequestVerification => "REQUEST_VERIFICATION",
            Self::EditMember => "EDIT_MEMBER",
            Self::FlagMember => "FLAG_MEMBER",
        }
    }
}

/// A display-ready story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    /// Creation time of the newest operation in the story
    pub timestamp: DateTime<Utc>,
    pub kind: StoryKind,
    pub content: StoryContent,
    /// The activities this story was built from. A bundle holds one per mint.
    pub unbundled: Vec<Activity>,
}

impl Story {
    /// Every operation behind this story, oldest first
    pub fn operations(&self) -> Vec<&Operation> {
        self.unbundled
            .iter()
            .flat_map(|activity| activity.operations())
            .collect()
    }

    pub fn is_bundle(&self) -> bool {
        self.unbundled.len() > 1
    }

    /// Creation time of the oldest operation, which orders the feed
    pub fn started_at(&self) -> DateTime<Utc> {
        self.unbundled
            .iter()
            .map(|activity| activity.first_operation().created_at)
            .min()
            .unwrap_or(self.timestamp)
    }
}
