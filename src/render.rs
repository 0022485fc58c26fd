//! Markup rendering for the shell.
//!
//! The daemon hands back finished HTML fragments plus panel-visibility
//! flags; the shell only injects them. Every remote-supplied string is
//! escaped here, nowhere else.

use chrono::DateTime;
use serde_json::{json, Value};

use crate::api::{DashboardMetrics, StaffMember, StudentRecord};
use crate::programs::ResolvedFaculty;

/// Visibility of the loading indicator, the populated list, and the
/// error panel. Exactly one is ever shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// Initial state the page ships with; responses report only the two
    /// terminal states.
    #[allow(dead_code)]
    Loading,
    Ready,
    Failed,
}

impl PanelState {
    pub fn flags(self) -> Value {
        json!({
            "loading": self == Self::Loading,
            "list": self == Self::Ready,
            "error": self == Self::Failed,
        })
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The faculties accordion: one item per faculty, departments laid out
/// two per row, first faculty expanded.
pub fn accordion(faculties: &[ResolvedFaculty]) -> String {
    let mut html = String::new();
    for (i, faculty) in faculties.iter().enumerate() {
        let expanded = i == 0;

        let mut departments = String::new();
        for (col, dept) in faculty.departments.iter().enumerate() {
            if col % 2 == 0 {
                if col > 0 {
                    departments.push_str("</div>");
                }
                departments.push_str("<div class=\"row\">");
            }
            departments.push_str("<div class=\"col-md-6\">");
            departments.push_str(&format!("<h5>{}</h5>", escape_html(&dept.name)));
            departments.push_str("<ul class=\"list-unstyled\">");
            for course in &dept.courses {
                departments.push_str(&format!(
                    "<li><i class=\"fas fa-graduation-cap me-2\"></i>{}</li>",
                    escape_html(course)
                ));
            }
            departments.push_str("</ul></div>");
        }
        if !faculty.departments.is_empty() {
            departments.push_str("</div>");
        }

        html.push_str(&format!(
            concat!(
                "<div class=\"accordion-item\">",
                "<h2 class=\"accordion-header\" id=\"heading{i}\">",
                "<button class=\"accordion-button{collapsed}\" type=\"button\" ",
                "data-bs-toggle=\"collapse\" data-bs-target=\"#collapse{i}\" ",
                "aria-expanded=\"{expanded}\" aria-controls=\"collapse{i}\">",
                "{icon} {name}",
                "</button></h2>",
                "<div id=\"collapse{i}\" class=\"accordion-collapse collapse{show}\" ",
                "aria-labelledby=\"heading{i}\" data-bs-parent=\"#facultiesAccordion\">",
                "<div class=\"accordion-body\">{departments}</div>",
                "</div></div>"
            ),
            i = i,
            collapsed = if expanded { "" } else { " collapsed" },
            expanded = expanded,
            show = if expanded { " show" } else { "" },
            icon = escape_html(&faculty.icon),
            name = escape_html(&faculty.name),
            departments = departments,
        ));
    }
    html
}

/// Metric display values; a missing metric renders the em-dash
/// placeholder rather than a zero.
pub fn metrics_values(m: &DashboardMetrics) -> Value {
    fn show(v: Option<i64>) -> String {
        v.map_or_else(|| "—".to_string(), |n| n.to_string())
    }
    json!({
        "totalStudents": show(m.total_students),
        "activeCourses": show(m.active_courses),
        "pendingApps": show(m.pending_applications),
    })
}

pub fn staff_info(s: &StaffMember) -> String {
    let name = format!(
        "{} {}",
        s.first_name.as_deref().unwrap_or(""),
        s.last_name.as_deref().unwrap_or("")
    );
    format!(
        concat!(
            "<strong>{name}</strong>",
            "<div class=\"muted-small\">{role} • {department}</div>",
            "<div class=\"muted-small\">Last login: {last_login}</div>"
        ),
        name = escape_html(name.trim()),
        role = escape_html(s.role.as_deref().unwrap_or("")),
        department = escape_html(s.department.as_deref().unwrap_or("")),
        last_login = s.last_login.as_deref().map_or_else(
            || "—".to_string(),
            |raw| format_timestamp(raw, "%Y-%m-%d %H:%M")
        ),
    )
}

pub fn student_rows(students: &[StudentRecord]) -> String {
    if students.is_empty() {
        return "<tr><td colspan=\"7\">No students found</td></tr>".to_string();
    }
    students.iter().map(student_row).collect()
}

pub fn student_row(s: &StudentRecord) -> String {
    let name = format!(
        "{} {}",
        s.first_name.as_deref().unwrap_or(""),
        s.last_name.as_deref().unwrap_or("")
    );
    format!(
        concat!(
            "<tr data-id=\"{id}\">",
            "<td>{student_id}</td>",
            "<td>{name}</td>",
            "<td>{email}</td>",
            "<td class=\"age\">{age}</td>",
            "<td class=\"phone\">{phone}</td>",
            "<td>{created}</td>",
            "<td class=\"action-row\"><button class=\"btn btn-edit\">Edit</button></td>",
            "</tr>"
        ),
        id = escape_html(&s.id),
        student_id = escape_html(&loose_text(s.student_id.as_ref()).unwrap_or_else(|| s.id.clone())),
        name = escape_html(name.trim()),
        email = escape_html(s.email.as_deref().unwrap_or("")),
        age = escape_html(&loose_text(s.age.as_ref()).unwrap_or_default()),
        phone = escape_html(s.phone.as_deref().unwrap_or("")),
        created = s
            .created_at
            .as_deref()
            .map(|raw| format_timestamp(raw, "%Y-%m-%d"))
            .unwrap_or_default(),
    )
}

pub fn team_list(staff: &[StaffMember]) -> String {
    if staff.is_empty() {
        return "<li>No team members</li>".to_string();
    }
    staff
        .iter()
        .map(|s| {
            format!(
                concat!(
                    "<li><div>",
                    "<strong>{first} {last}</strong>",
                    "<div class=\"muted-small\">{role} • {department}</div>",
                    "</div>",
                    "<div class=\"muted-small\">{email}</div></li>"
                ),
                first = escape_html(s.first_name.as_deref().unwrap_or("")),
                last = escape_html(s.last_name.as_deref().unwrap_or("")),
                role = escape_html(s.role.as_deref().unwrap_or("")),
                department = escape_html(s.department.as_deref().unwrap_or("")),
                email = escape_html(s.email.as_deref().unwrap_or("")),
            )
        })
        .collect()
}

/// Numbers and strings both display; anything else is blank.
fn loose_text(v: Option<&Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Render an RFC 3339 timestamp with `fmt`; anything unparseable is
/// shown as-is rather than dropped.
fn format_timestamp(raw: &str, fmt: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format(fmt).to_string(),
        Err(_) => raw.to_string(),
    }
}
