//! Askama templates for the shell, the header and every page.

use askama::Template;
use askama_web::WebTemplate;

use club_core::{EventCategory, PublicationCategory, Route, Session};

use super::{
    AboutData, AuthForm, CommitteeYear, ContactForm, EventsData, GalleryYear, HomeData, Load,
    PageData, PartnerGroup, PublicationsData,
};
use crate::admin::{AdminState, FieldKind, Section, display, lookup};
use crate::filters;
use crate::nav::{NavState, PageView};

/// Links shown in the header, in order.
const NAV_ROUTES: [Route; 8] = [
    Route::Home,
    Route::About,
    Route::Committee,
    Route::Events,
    Route::Publications,
    Route::Gallery,
    Route::Partners,
    Route::Contact,
];

/// The HTML document served at `/`. The live script fills header and main.
#[derive(Template, WebTemplate)]
#[template(path = "shell.html")]
pub struct ShellTemplate {
    pub site_name: &'static str,
}

struct NavLink {
    token: &'static str,
    label: &'static str,
    active: bool,
}

#[derive(Template)]
#[template(path = "partials/header.html")]
struct HeaderTemplate<'a> {
    links: Vec<NavLink>,
    session: Option<&'a Session>,
    portal: NavLink,
}

/// Render the header for the controller state.
///
/// # Errors
///
/// Returns the askama error if rendering fails.
pub fn render_header(state: &NavState) -> askama::Result<String> {
    let portal_route = if state.privilege {
        Route::Admin
    } else {
        Route::Portal
    };

    HeaderTemplate {
        links: NAV_ROUTES
            .into_iter()
            .map(|route| NavLink {
                token: route.token(),
                label: route.label(),
                active: route == state.route,
            })
            .collect(),
        session: state.session.as_ref(),
        portal: NavLink {
            token: portal_route.token(),
            label: portal_route.label(),
            active: state.route == portal_route,
        },
    }
    .render()
}

/// Load progress shown by content pages.
struct Status<'a> {
    loading: bool,
    error: Option<&'a str>,
}

impl<'a> Status<'a> {
    fn of<T>(load: &'a Load<T>) -> Self {
        Self {
            loading: load.is_pending(),
            error: load.error(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/loading.html")]
struct LoadingTemplate;

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomeTemplate<'a> {
    status: Status<'a>,
    data: Option<&'a HomeData>,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
struct AboutTemplate<'a> {
    status: Status<'a>,
    data: Option<&'a AboutData>,
}

#[derive(Template)]
#[template(path = "pages/committee.html")]
struct CommitteeTemplate<'a> {
    status: Status<'a>,
    years: Option<&'a [CommitteeYear]>,
}

#[derive(Template)]
#[template(path = "pages/events.html")]
struct EventsTemplate<'a> {
    status: Status<'a>,
    data: Option<&'a EventsData>,
    categories: Vec<&'static str>,
}

#[derive(Template)]
#[template(path = "pages/publications.html")]
struct PublicationsTemplate<'a> {
    status: Status<'a>,
    data: Option<&'a PublicationsData>,
    categories: Vec<&'static str>,
}

#[derive(Template)]
#[template(path = "pages/gallery.html")]
struct GalleryTemplate<'a> {
    status: Status<'a>,
    years: Option<&'a [GalleryYear]>,
}

#[derive(Template)]
#[template(path = "pages/partners.html")]
struct PartnersTemplate<'a> {
    status: Status<'a>,
    groups: Option<&'a [PartnerGroup]>,
}

#[derive(Template)]
#[template(path = "pages/join.html")]
struct JoinTemplate;

#[derive(Template)]
#[template(path = "pages/contact.html")]
struct ContactTemplate<'a> {
    form: &'a ContactForm,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
struct LoginTemplate<'a> {
    form: &'a AuthForm,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
struct RegisterTemplate<'a> {
    form: &'a AuthForm,
}

#[derive(Template)]
#[template(path = "pages/portal.html")]
struct PortalTemplate<'a> {
    session: &'a Session,
}

struct Tab {
    key: &'static str,
    label: &'static str,
    active: bool,
}

struct Row {
    id: String,
    cells: Vec<String>,
}

struct OptionView {
    value: &'static str,
    selected: bool,
}

struct FieldView {
    name: &'static str,
    label: &'static str,
    input: &'static str,
    value: String,
    required: bool,
    options: Vec<OptionView>,
}

struct EditorView<'a> {
    heading: String,
    fields: Vec<FieldView>,
    error: Option<&'a str>,
    saving: bool,
}

#[derive(Template)]
#[template(path = "pages/admin.html")]
struct AdminTemplate<'a> {
    session: &'a Session,
    tabs: Vec<Tab>,
    section: Section,
    headers: Vec<&'static str>,
    rows: Vec<Row>,
    status: Status<'a>,
    notice: Option<&'a str>,
    editor: Option<EditorView<'a>>,
}

impl<'a> AdminTemplate<'a> {
    fn new(session: &'a Session, admin: &'a AdminState) -> Self {
        let section = admin.section;
        let columns = section.columns();

        let rows = admin
            .items
            .ready()
            .map(|documents| {
                documents
                    .iter()
                    .map(|document| Row {
                        id: document.id.to_string(),
                        cells: columns
                            .iter()
                            .map(|column| {
                                let value = lookup(&document.fields, column.path)
                                    .map(display)
                                    .unwrap_or_default();
                                if column.path == "timestamp" {
                                    format_timestamp(&value)
                                } else {
                                    value
                                }
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let editor = admin.editor.as_ref().map(|editor| EditorView {
            heading: format!(
                "{} {}",
                if editor.id.is_some() {
                    "Edit"
                } else {
                    "Add New"
                },
                section.noun()
            ),
            fields: section
                .fields()
                .iter()
                .map(|spec| {
                    let value = editor.values.get(spec.name).cloned().unwrap_or_default();
                    let (input, options) = match spec.kind {
                        FieldKind::Text => ("text", Vec::new()),
                        FieldKind::LongText => ("textarea", Vec::new()),
                        FieldKind::Url => ("url", Vec::new()),
                        FieldKind::Number => ("number", Vec::new()),
                        FieldKind::Checkbox => ("checkbox", Vec::new()),
                        FieldKind::Select(options) => (
                            "select",
                            options
                                .iter()
                                .map(|option| OptionView {
                                    value: option,
                                    selected: *option == value,
                                })
                                .collect(),
                        ),
                    };
                    FieldView {
                        name: spec.name,
                        label: spec.label,
                        input,
                        value,
                        required: spec.required,
                        options,
                    }
                })
                .collect(),
            error: editor.error.as_deref(),
            saving: editor.saving,
        });

        Self {
            session,
            tabs: Section::ALL
                .into_iter()
                .map(|tab| Tab {
                    key: tab.key(),
                    label: tab.label(),
                    active: tab == section,
                })
                .collect(),
            section,
            headers: columns.iter().map(|column| column.label).collect(),
            rows,
            status: Status::of(&admin.items),
            notice: admin.notice.as_deref(),
            editor,
        }
    }
}

fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |stamp| stamp.format("%d %b %Y, %H:%M").to_string(),
    )
}

/// Everything the main area may show.
pub struct MainContext<'a> {
    pub view: &'a PageView,
    pub data: &'a Load<PageData>,
    pub login: &'a AuthForm,
    pub register: &'a AuthForm,
    pub contact: &'a ContactForm,
    pub admin: &'a AdminState,
}

/// Render the main area.
///
/// # Errors
///
/// Returns the askama error if rendering fails.
pub fn render_main(ctx: &MainContext<'_>) -> askama::Result<String> {
    let status = Status::of(ctx.data);
    let data = ctx.data.ready();

    match ctx.view {
        PageView::Loading => LoadingTemplate.render(),
        PageView::Home => HomeTemplate {
            status,
            data: match data {
                Some(PageData::Home(home)) => Some(home),
                _ => None,
            },
        }
        .render(),
        PageView::About => AboutTemplate {
            status,
            data: match data {
                Some(PageData::About(about)) => Some(about),
                _ => None,
            },
        }
        .render(),
        PageView::Committee => CommitteeTemplate {
            status,
            years: match data {
                Some(PageData::Committee(years)) => Some(years.as_slice()),
                _ => None,
            },
        }
        .render(),
        PageView::Events => EventsTemplate {
            status,
            data: match data {
                Some(PageData::Events(events)) => Some(events),
                _ => None,
            },
            categories: EventCategory::ALL.map(EventCategory::as_str).to_vec(),
        }
        .render(),
        PageView::Publications => PublicationsTemplate {
            status,
            data: match data {
                Some(PageData::Publications(publications)) => Some(publications),
                _ => None,
            },
            categories: PublicationCategory::ALL
                .map(PublicationCategory::as_str)
                .to_vec(),
        }
        .render(),
        PageView::Gallery => GalleryTemplate {
            status,
            years: match data {
                Some(PageData::Gallery(years)) => Some(years.as_slice()),
                _ => None,
            },
        }
        .render(),
        PageView::Partners => PartnersTemplate {
            status,
            groups: match data {
                Some(PageData::Partners(groups)) => Some(groups.as_slice()),
                _ => None,
            },
        }
        .render(),
        PageView::Join => JoinTemplate.render(),
        PageView::Contact => ContactTemplate { form: ctx.contact }.render(),
        PageView::Login => LoginTemplate { form: ctx.login }.render(),
        PageView::Register => RegisterTemplate { form: ctx.register }.render(),
        PageView::Portal(session) => PortalTemplate { session }.render(),
        PageView::Admin(session) => AdminTemplate::new(session, ctx.admin).render(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::admin::AdminAction;
    use crate::store::Document;
    use club_core::{DocumentId, Email, IdentityRef};
    use serde_json::json;

    fn session() -> Session {
        Session::new(
            IdentityRef::new("u1"),
            Email::parse("member@club.org").unwrap(),
        )
    }

    fn context<'a>(
        view: &'a PageView,
        data: &'a Load<PageData>,
        forms: &'a (AuthForm, AuthForm, ContactForm),
        admin: &'a AdminState,
    ) -> MainContext<'a> {
        MainContext {
            view,
            data,
            login: &forms.0,
            register: &forms.1,
            contact: &forms.2,
            admin,
        }
    }

    #[test]
    fn test_header_for_privileged_session() {
        let state = NavState {
            route: Route::Events,
            session: Some(session()),
            privilege: true,
            session_checked: true,
        };
        let html = render_header(&state).unwrap();
        assert!(html.contains("Admin Panel"));
        assert!(html.contains("member@club.org"));
        assert!(html.contains("data-live=\"sign_out\""));
        assert!(!html.contains("Portal Login"));
    }

    #[test]
    fn test_header_signed_out() {
        let html = render_header(&NavState::default()).unwrap();
        assert!(html.contains("Portal Login"));
        assert!(html.contains("Join Us"));
        assert!(!html.contains("sign_out"));
    }

    #[test]
    fn test_header_links_go_through_navigation() {
        let signed_in = NavState {
            route: Route::Home,
            session: Some(session()),
            privilege: false,
            session_checked: true,
        };
        for state in [NavState::default(), signed_in] {
            let html = render_header(&state).unwrap();
            for link in html.split("<a ").skip(1) {
                let token = link
                    .split("href=\"#")
                    .nth(1)
                    .and_then(|rest| rest.split('"').next())
                    .unwrap();
                assert!(
                    link.contains(&format!("data-navigate=\"{token}\"")),
                    "{link}"
                );
            }
        }
    }

    #[test]
    fn test_login_error_is_escaped_inline() {
        let forms = (
            AuthForm {
                email: "a@club.org".into(),
                error: Some("<b>bad</b>".into()),
                pending: false,
            },
            AuthForm::default(),
            ContactForm::default(),
        );
        let admin = AdminState::default();
        let html = render_main(&context(
            &PageView::Login,
            &Load::Ready(PageData::Static),
            &forms,
            &admin,
        ))
        .unwrap();
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(html.contains("a@club.org"));
    }

    #[test]
    fn test_pending_content_page_shows_loading() {
        let forms = (
            AuthForm::default(),
            AuthForm::default(),
            ContactForm::default(),
        );
        let admin = AdminState::default();
        let html =
            render_main(&context(&PageView::Events, &Load::Pending, &forms, &admin)).unwrap();
        assert!(html.contains("Loading"));
    }

    #[test]
    fn test_admin_page_lists_rows_and_editor() {
        let mut admin = AdminState::default();
        admin.items = Load::Ready(vec![Document {
            id: DocumentId::new("e1"),
            fields: json!({ "title": "Spring Fest", "date": "14 APR", "category": "Festival", "status": "upcoming" })
                .as_object()
                .cloned()
                .unwrap(),
        }]);
        admin.apply(AdminAction::Edit {
            section: Section::Events,
            id: DocumentId::new("e1"),
        });

        let forms = (
            AuthForm::default(),
            AuthForm::default(),
            ContactForm::default(),
        );
        let view = PageView::Admin(session());
        let html = render_main(&context(
            &view,
            &Load::Ready(PageData::Static),
            &forms,
            &admin,
        ))
        .unwrap();
        assert!(html.contains("Spring Fest"));
        assert!(html.contains("data-id=\"e1\""));
        assert!(html.contains("Edit event"));
        assert!(html.contains("<option value=\"Festival\" selected"));
    }

    #[test]
    fn test_message_timestamps_are_formatted() {
        assert_eq!(
            format_timestamp("2024-12-25T10:30:00Z"),
            "25 Dec 2024, 10:30"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
