//! Fallback-aware resolution of the faculties→departments→courses view.
//!
//! The contract, in order:
//! - faculties fetch fails or comes back empty → the whole view is built
//!   from the static catalog, no mixing at the faculty level;
//! - a single faculty's department fetch fails or comes back empty →
//!   only that faculty substitutes its static departments, matched by
//!   name; already-resolved siblings keep their live data;
//! - a department with no courses gets the synthesized three-entry list.
//!
//! Resolution is pure data-in/data-out behind [`ProgramSource`], so the
//! fallback logic is tested without a network or a page.

use crate::api::{Department, Faculty, RemoteApi};
use crate::catalog::{self, StaticFaculty};

pub trait ProgramSource {
    fn faculties(&self) -> Vec<Faculty>;
    fn departments_for(&self, faculty: &Faculty) -> Vec<Department>;
}

impl ProgramSource for RemoteApi {
    fn faculties(&self) -> Vec<Faculty> {
        self.fetch_faculties()
    }

    fn departments_for(&self, faculty: &Faculty) -> Vec<Department> {
        match faculty.key() {
            Some(key) => self.faculty_departments(key),
            None => Vec::new(),
        }
    }
}

/// The static table wrapped for injection; production uses the bundled
/// table, tests substitute their own slices.
pub struct StaticCatalog {
    faculties: &'static [StaticFaculty],
}

impl StaticCatalog {
    pub const fn bundled() -> Self {
        Self {
            faculties: catalog::FACULTIES,
        }
    }

    #[cfg(test)]
    pub const fn with_table(faculties: &'static [StaticFaculty]) -> Self {
        Self { faculties }
    }

    /// Department names for a faculty, matched case-insensitively; the
    /// short form without the `"FACULTY OF "` prefix is accepted too,
    /// since remote records use both spellings.
    fn departments_for(&self, faculty_name: &str) -> Option<&'static [&'static str]> {
        let wanted = faculty_name.trim();
        self.faculties
            .iter()
            .find(|f| {
                f.name.eq_ignore_ascii_case(wanted)
                    || f.name
                        .strip_prefix("FACULTY OF ")
                        .is_some_and(|short| short.eq_ignore_ascii_case(wanted))
            })
            .map(|f| f.departments)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Api,
    Static,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Static => "static",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedDepartment {
    pub name: String,
    pub courses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedFaculty {
    pub name: String,
    pub icon: String,
    pub departments: Vec<ResolvedDepartment>,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub source: Source,
    pub faculties: Vec<ResolvedFaculty>,
}

const DEFAULT_ICON: &str = "📚";

/// Resolve the program view, live first, static wherever the live path
/// yields nothing. `None` means both paths produced no faculties at all
/// (the caller shows the error panel).
pub fn resolve_programs(live: &dyn ProgramSource, fallback: &StaticCatalog) -> Option<Resolution> {
    let faculties = live.faculties();
    if faculties.is_empty() {
        return resolve_static(fallback).map(|faculties| Resolution {
            source: Source::Static,
            faculties,
        });
    }

    let mut resolved = Vec::with_capacity(faculties.len());
    for faculty in &faculties {
        let mut departments: Vec<ResolvedDepartment> = live
            .departments_for(faculty)
            .into_iter()
            .map(|d| resolve_department(d, &faculty.name))
            .collect();
        if departments.is_empty() {
            departments = static_departments(fallback, &faculty.name);
        }
        resolved.push(ResolvedFaculty {
            name: faculty.name.clone(),
            icon: faculty
                .icon
                .clone()
                .unwrap_or_else(|| DEFAULT_ICON.to_string()),
            departments,
        });
    }
    Some(Resolution {
        source: Source::Api,
        faculties: resolved,
    })
}

fn resolve_department(dept: Department, faculty_name: &str) -> ResolvedDepartment {
    let courses = if dept.courses.is_empty() {
        catalog::course_options(&dept.name, faculty_name)
    } else {
        dept.courses.into_iter().map(|c| c.name).collect()
    };
    ResolvedDepartment {
        name: dept.name,
        courses,
    }
}

fn static_departments(fallback: &StaticCatalog, faculty_name: &str) -> Vec<ResolvedDepartment> {
    fallback
        .departments_for(faculty_name)
        .unwrap_or(&[])
        .iter()
        .map(|name| ResolvedDepartment {
            name: (*name).to_string(),
            courses: catalog::course_options(name, faculty_name),
        })
        .collect()
}

fn resolve_static(fallback: &StaticCatalog) -> Option<Vec<ResolvedFaculty>> {
    if fallback.faculties.is_empty() {
        return None;
    }
    Some(
        fallback
            .faculties
            .iter()
            .map(|f| ResolvedFaculty {
                name: f.name.to_string(),
                icon: f.icon.to_string(),
                departments: f
                    .departments
                    .iter()
                    .map(|name| ResolvedDepartment {
                        name: (*name).to_string(),
                        courses: catalog::course_options(name, f.name),
                    })
                    .collect(),
            })
            .collect(),
    )
}
