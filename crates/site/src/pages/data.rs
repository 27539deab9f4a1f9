//! Content loaded for each page.

use club_core::{
    Advisor, Collection, Event, EventStatus, GalleryItem, Member, Partner, PartnerType,
    Publication, Stored,
};

use crate::nav::PageView;
use crate::store::{self, ContentStore, Records, StoreError};

/// Number of upcoming events and leaders shown on the home page.
const HOME_HIGHLIGHTS: usize = 3;

/// Data behind a rendered page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageData {
    /// The page shows no stored content.
    Static,
    Home(HomeData),
    About(AboutData),
    Committee(Vec<CommitteeYear>),
    Events(EventsData),
    Publications(PublicationsData),
    Gallery(Vec<GalleryYear>),
    Partners(Vec<PartnerGroup>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeData {
    pub upcoming: Vec<Stored<Event>>,
    pub leadership: Vec<Member>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AboutData {
    pub advisors: Vec<Stored<Advisor>>,
    pub committee: Vec<CommitteeYear>,
}

/// Members of one committee year, leadership first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitteeYear {
    /// `None` for members stored without a year.
    pub year: Option<i32>,
    pub leadership: Vec<Member>,
    pub members: Vec<Member>,
}

impl CommitteeYear {
    #[must_use]
    pub fn heading(&self) -> String {
        self.year.map_or_else(
            || "Committee".to_string(),
            |year| format!("Committee {year}"),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsData {
    pub upcoming: Vec<Stored<Event>>,
    pub past: Vec<Stored<Event>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicationsData {
    pub featured: Vec<Stored<Publication>>,
    pub others: Vec<Stored<Publication>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryYear {
    pub year: i32,
    pub items: Vec<Stored<GalleryItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerGroup {
    pub partner_type: PartnerType,
    pub partners: Vec<Stored<Partner>>,
}

/// Load what `page` needs.
///
/// # Errors
///
/// Returns the first store error; the page shows it in place of content.
pub async fn load(page: &PageView, store: &dyn ContentStore) -> Result<PageData, StoreError> {
    Ok(match page {
        PageView::Home => {
            let events = store.records::<Event>().await?;
            let years = committee_years(store).await?;
            PageData::Home(HomeData {
                upcoming: events
                    .into_iter()
                    .filter(|e| e.record.status == EventStatus::Upcoming)
                    .take(HOME_HIGHLIGHTS)
                    .collect(),
                leadership: home_leadership(&years),
            })
        }
        PageView::About => PageData::About(AboutData {
            advisors: store.records::<Advisor>().await?,
            committee: committee_years(store).await?,
        }),
        PageView::Committee => PageData::Committee(committee_years(store).await?),
        PageView::Events => {
            let (upcoming, past) = store
                .records::<Event>()
                .await?
                .into_iter()
                .partition(|e| e.record.status == EventStatus::Upcoming);
            PageData::Events(EventsData { upcoming, past })
        }
        PageView::Publications => {
            let (featured, others) = store
                .records::<Publication>()
                .await?
                .into_iter()
                .partition(|p| p.record.is_featured);
            PageData::Publications(PublicationsData { featured, others })
        }
        PageView::Gallery => PageData::Gallery(gallery_years(store.records().await?)),
        PageView::Partners => PageData::Partners(partner_groups(store.records().await?)),
        PageView::Loading
        | PageView::Join
        | PageView::Contact
        | PageView::Login
        | PageView::Register
        | PageView::Portal(_)
        | PageView::Admin(_) => PageData::Static,
    })
}

/// Committee members grouped by year, newest year first, members without a
/// year last. Within a year the leadership roles come first in their fixed
/// order.
///
/// # Errors
///
/// Returns the store error of the underlying listing.
pub async fn committee_years(store: &dyn ContentStore) -> Result<Vec<CommitteeYear>, StoreError> {
    let groups = store
        .list_grouped_by(Collection::Committees, "year")
        .await?;

    let mut years: Vec<CommitteeYear> = groups
        .into_iter()
        .map(|(key, documents)| {
            let members = documents
                .into_iter()
                .filter_map(|document| match store::decode::<Member>(document) {
                    Ok(stored) => Some(stored.record),
                    Err(err) => {
                        tracing::warn!(error = %err, "Skipping undecodable committee member");
                        None
                    }
                })
                .collect();
            split_leadership(key.parse().ok(), members)
        })
        .collect();

    years.sort_by_key(|year| std::cmp::Reverse(year.year));
    Ok(years)
}

fn split_leadership(year: Option<i32>, members: Vec<Member>) -> CommitteeYear {
    let (mut leadership, members): (Vec<Member>, Vec<Member>) = members
        .into_iter()
        .partition(|member| member.leadership_rank().is_some());
    leadership.sort_by_key(Member::leadership_rank);
    CommitteeYear {
        year,
        leadership,
        members,
    }
}

/// First members of the most recent committee year.
#[must_use]
pub fn home_leadership(years: &[CommitteeYear]) -> Vec<Member> {
    years
        .iter()
        .find(|year| year.year.is_some())
        .map(|year| {
            year.leadership
                .iter()
                .chain(&year.members)
                .take(HOME_HIGHLIGHTS)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn gallery_years(items: Vec<Stored<GalleryItem>>) -> Vec<GalleryYear> {
    let mut years: Vec<GalleryYear> = Vec::new();
    for item in items {
        match years.iter_mut().find(|year| year.year == item.record.year) {
            Some(year) => year.items.push(item),
            None => years.push(GalleryYear {
                year: item.record.year,
                items: vec![item],
            }),
        }
    }
    years.sort_by_key(|year| std::cmp::Reverse(year.year));
    years
}

fn partner_groups(partners: Vec<Stored<Partner>>) -> Vec<PartnerGroup> {
    PartnerType::ALL
        .into_iter()
        .map(|partner_type| PartnerGroup {
            partner_type,
            partners: partners
                .iter()
                .filter(|p| p.record.partner_type == partner_type)
                .cloned()
                .collect(),
        })
        .filter(|group| !group.partners.is_empty())
        .collect()
}
