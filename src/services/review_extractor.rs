use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::review::{yes_no, ReviewRecord};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("no selector configured for {0}")]
    MissingSelector(&'static str),
}

/// CSS selectors per field, primary first, then fallbacks for older markup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub container: Vec<String>,
    pub rating: Vec<String>,
    pub date: Vec<String>,
    pub title: Vec<String>,
    pub role: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub tags: Vec<String>,
    pub markers: TagMarkers,
}

/// Substrings that switch a tag-derived flag to "Yes".
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TagMarkers {
    pub recommends: Vec<String>,
    pub approval: Vec<String>,
    pub outlook: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorSet {
    fn default() -> Self {
        SelectorSet {
            container: owned(&[
                "div[data-test='review-details-container']",
                "li[id^='empReview']",
                "div.gdReview",
            ]),
            rating: owned(&[
                "span[data-test='review-rating-label']",
                "span.ratingNumber",
            ]),
            date: owned(&[
                "span.timestamp_reviewDate__dsF9n",
                "span[class*='reviewDate']",
                "time",
            ]),
            title: owned(&[
                "h3[data-test='review-details-title']",
                "h2[data-test='review-details-title']",
                "a.reviewLink",
            ]),
            role: owned(&[
                "span[data-test='review-avatar-label']",
                "span.authorJobTitle",
            ]),
            pros: owned(&[
                "span[data-test='review-text-PROS']",
                "span[data-test='pros']",
            ]),
            cons: owned(&[
                "span[data-test='review-text-CONS']",
                "span[data-test='cons']",
            ]),
            tags: owned(&[
                "div.rating-icon_ratingContainer__9UoJ6 span",
                "div[class*='ratingContainer'] span",
            ]),
            markers: TagMarkers::default(),
        }
    }
}

impl Default for TagMarkers {
    fn default() -> Self {
        TagMarkers {
            recommends: owned(&["Recommend", "Recommande"]),
            approval: owned(&["CEO", "PDG"]),
            outlook: owned(&["Outlook", "Perspective"]),
        }
    }
}

struct FieldSelectors(Vec<Selector>);

impl FieldSelectors {
    fn compile(list: &[String]) -> Result<Self, ExtractError> {
        list.iter()
            .map(|raw| {
                Selector::parse(raw).map_err(|e| ExtractError::InvalidSelector {
                    selector: raw.clone(),
                    reason: format!("{:?}", e),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FieldSelectors)
    }

    /// Text of the first selector that finds something non-blank, else "".
    fn first_text(&self, fragment: ElementRef) -> String {
        self.0
            .iter()
            .filter_map(|selector| fragment.select(selector).next())
            .map(element_text)
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    /// All matches of the first selector that matches anything.
    fn all_texts(&self, fragment: ElementRef) -> Vec<String> {
        self.0
            .iter()
            .map(|selector| {
                fragment
                    .select(selector)
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
            })
            .find(|texts| !texts.is_empty())
            .unwrap_or_default()
    }
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .join(" ")
}

fn has_marker(tags: &[String], markers: &[String]) -> bool {
    tags.iter()
        .any(|tag| markers.iter().any(|marker| tag.contains(marker.as_str())))
}

pub struct ReviewExtractor {
    container: FieldSelectors,
    rating: FieldSelectors,
    date: FieldSelectors,
    title: FieldSelectors,
    role: FieldSelectors,
    pros: FieldSelectors,
    cons: FieldSelectors,
    tags: FieldSelectors,
    markers: TagMarkers,
}

impl ReviewExtractor {
    pub fn new(selectors: &SelectorSet) -> Result<Self, ExtractError> {
        if selectors.container.is_empty() {
            return Err(ExtractError::MissingSelector("container"));
        }

        Ok(ReviewExtractor {
            container: FieldSelectors::compile(&selectors.container)?,
            rating: FieldSelectors::compile(&selectors.rating)?,
            date: FieldSelectors::compile(&selectors.date)?,
            title: FieldSelectors::compile(&selectors.title)?,
            role: FieldSelectors::compile(&selectors.role)?,
            pros: FieldSelectors::compile(&selectors.pros)?,
            cons: FieldSelectors::compile(&selectors.cons)?,
            tags: FieldSelectors::compile(&selectors.tags)?,
            markers: selectors.markers.clone(),
        })
    }

    /// Record containers in document order.
    pub fn fragments<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        self.container
            .0
            .iter()
            .map(|selector| document.select(selector).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    pub fn extract_record(&self, fragment: ElementRef) -> ReviewRecord {
        let tags = self.tags.all_texts(fragment);

        ReviewRecord {
            rating: self.rating.first_text(fragment),
            date: self.date.first_text(fragment),
            title: self.title.first_text(fragment),
            role: self.role.first_text(fragment),
            pros: self.pros.first_text(fragment),
            cons: self.cons.first_text(fragment),
            recommends: yes_no(has_marker(&tags, &self.markers.recommends)),
            approval: yes_no(has_marker(&tags, &self.markers.approval)),
            outlook: yes_no(has_marker(&tags, &self.markers.outlook)),
        }
    }

    pub fn extract_page<'a>(
        &self,
        fragments: impl IntoIterator<Item = ElementRef<'a>>,
    ) -> Vec<ReviewRecord> {
        fragments
            .into_iter()
            .map(|fragment| self.extract_record(fragment))
            .collect()
    }

    pub fn extract_document(&self, html: &str) -> Vec<ReviewRecord> {
        let document = Html::parse_document(html);
        self.extract_page(self.fragments(&document))
    }
}
