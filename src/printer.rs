//! Rendering advice as declaration source text.
//!
//! The rewriter treats printed text as an opaque string; everything
//! dialect-specific lives here.

use crate::advice::{Advice, Coordinates};

/// Target build-script dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dsl {
    #[default]
    Groovy,
    Kotlin,
}

impl Dsl {
    /// Pick the dialect from a build-script file name.
    /// `build.gradle.kts` is Kotlin; everything else is Groovy.
    pub fn for_file_name(name: &str) -> Self {
        if name.ends_with(".kts") {
            Dsl::Kotlin
        } else {
            Dsl::Groovy
        }
    }
}

/// Prints one advice item as a complete dependency declaration for a target
/// dialect.
#[derive(Debug, Clone, Copy)]
pub struct AdvicePrinter {
    dsl: Dsl,
}

impl AdvicePrinter {
    pub fn new(dsl: Dsl) -> Self {
        Self { dsl }
    }

    pub fn dsl(&self) -> Dsl {
        self.dsl
    }

    /// The full declaration text, e.g. `implementation("g:a:v")` (Kotlin) or
    /// `implementation 'g:a:v'` (Groovy).
    pub fn to_declaration(&self, advice: &Advice) -> String {
        let configuration = advice.target_configuration();
        let dependency = self.dependency_notation(advice.target_coordinates());
        match self.dsl {
            Dsl::Groovy => format!("{configuration} {dependency}"),
            Dsl::Kotlin => format!("{configuration}({dependency})"),
        }
    }

    fn dependency_notation(&self, coordinates: &Coordinates) -> String {
        let gav = coordinates.gav();
        match (self.dsl, coordinates.is_project()) {
            (Dsl::Groovy, true) => format!("project('{gav}')"),
            (Dsl::Groovy, false) => format!("'{gav}'"),
            (Dsl::Kotlin, true) => format!("project(\"{gav}\")"),
            (Dsl::Kotlin, false) => format!("\"{gav}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(coordinates: &str, to: &str) -> Advice {
        Advice::Add {
            coordinates: Coordinates::parse(coordinates),
            to_configuration: to.into(),
        }
    }

    #[test]
    fn groovy_module_declaration() {
        let printer = AdvicePrinter::new(Dsl::Groovy);
        assert_eq!(
            printer.to_declaration(&add("com.acme:widget:2.1", "implementation")),
            "implementation 'com.acme:widget:2.1'"
        );
    }

    #[test]
    fn groovy_project_declaration() {
        let printer = AdvicePrinter::new(Dsl::Groovy);
        assert_eq!(
            printer.to_declaration(&add(":core", "api")),
            "api project(':core')"
        );
    }

    #[test]
    fn kotlin_module_declaration() {
        let printer = AdvicePrinter::new(Dsl::Kotlin);
        assert_eq!(
            printer.to_declaration(&add("com.acme:widget:2.1", "implementation")),
            "implementation(\"com.acme:widget:2.1\")"
        );
    }

    #[test]
    fn kotlin_project_declaration() {
        let printer = AdvicePrinter::new(Dsl::Kotlin);
        assert_eq!(
            printer.to_declaration(&add(":core", "api")),
            "api(project(\":core\"))"
        );
    }

    #[test]
    fn change_prints_target_side() {
        let printer = AdvicePrinter::new(Dsl::Kotlin);
        let change = Advice::Change {
            coordinates: Coordinates::parse(":b"),
            from_configuration: "api".into(),
            to_configuration: "compileOnly".into(),
            to_coordinates: None,
        };
        assert_eq!(
            printer.to_declaration(&change),
            "compileOnly(project(\":b\"))"
        );
    }

    #[test]
    fn dialect_from_file_name() {
        assert_eq!(Dsl::for_file_name("build.gradle"), Dsl::Groovy);
        assert_eq!(Dsl::for_file_name("build.gradle.kts"), Dsl::Kotlin);
    }
}
