//! Static keyword lexicons and reference tables.
//!
//! Everything here is immutable process-wide data. Tables are plain
//! `static` slices; the compiled matchers are built once on first use and
//! then shared read-only by every pipeline run.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{Capability, Domain};

/// Domain keywords. Multi-word entries match as whole phrases.
pub static DOMAIN_KEYWORDS: &[(&str, Domain)] = &[
    ("security", Domain::Security),
    ("secure", Domain::Security),
    ("owasp", Domain::Security),
    ("vulnerability", Domain::Security),
    ("vulnerabilities", Domain::Security),
    ("audit", Domain::Security),
    ("penetration", Domain::Security),
    ("pentest", Domain::Security),
    ("authentication", Domain::Security),
    ("authorization", Domain::Security),
    ("encryption", Domain::Security),
    ("compliance", Domain::Security),
    ("cve", Domain::Security),
    ("xss", Domain::Security),
    ("csrf", Domain::Security),
    ("threat", Domain::Security),
    ("backend", Domain::Backend),
    ("back-end", Domain::Backend),
    ("api", Domain::Backend),
    ("apis", Domain::Backend),
    ("server", Domain::Backend),
    ("rest", Domain::Backend),
    ("graphql", Domain::Backend),
    ("microservice", Domain::Backend),
    ("microservices", Domain::Backend),
    ("endpoint", Domain::Backend),
    ("endpoints", Domain::Backend),
    ("full-stack", Domain::Backend),
    ("fullstack", Domain::Backend),
    ("frontend", Domain::Frontend),
    ("front-end", Domain::Frontend),
    ("ui", Domain::Frontend),
    ("ux", Domain::Frontend),
    ("css", Domain::Frontend),
    ("html", Domain::Frontend),
    ("component", Domain::Frontend),
    ("components", Domain::Frontend),
    ("web page", Domain::Frontend),
    ("accessibility", Domain::Frontend),
    ("full-stack", Domain::Frontend),
    ("fullstack", Domain::Frontend),
    ("database", Domain::Database),
    ("databases", Domain::Database),
    ("sql", Domain::Database),
    ("postgres", Domain::Database),
    ("postgresql", Domain::Database),
    ("mysql", Domain::Database),
    ("schema", Domain::Database),
    ("migration", Domain::Database),
    ("migrations", Domain::Database),
    ("query", Domain::Database),
    ("queries", Domain::Database),
    ("devops", Domain::DevOps),
    ("deploy", Domain::DevOps),
    ("deployment", Domain::DevOps),
    ("deployments", Domain::DevOps),
    ("docker", Domain::DevOps),
    ("kubernetes", Domain::DevOps),
    ("k8s", Domain::DevOps),
    ("ci", Domain::DevOps),
    ("cd", Domain::DevOps),
    ("pipeline", Domain::DevOps),
    ("infrastructure", Domain::DevOps),
    ("terraform", Domain::DevOps),
    ("helm", Domain::DevOps),
    ("test", Domain::Testing),
    ("tests", Domain::Testing),
    ("testing", Domain::Testing),
    ("coverage", Domain::Testing),
    ("e2e", Domain::Testing),
    ("unit test", Domain::Testing),
    ("integration test", Domain::Testing),
    ("regression", Domain::Testing),
    ("data", Domain::Data),
    ("analytics", Domain::Data),
    ("dataset", Domain::Data),
    ("datasets", Domain::Data),
    ("etl", Domain::Data),
    ("machine learning", Domain::Data),
    ("ml", Domain::Data),
    ("statistics", Domain::Data),
    ("dashboard", Domain::Data),
    ("notebook", Domain::Data),
    ("mobile", Domain::Mobile),
    ("ios", Domain::Mobile),
    ("android", Domain::Mobile),
    ("app store", Domain::Mobile),
    ("format", Domain::CodeQuality),
    ("formats", Domain::CodeQuality),
    ("formatter", Domain::CodeQuality),
    ("formatting", Domain::CodeQuality),
    ("lint", Domain::CodeQuality),
    ("linter", Domain::CodeQuality),
    ("linting", Domain::CodeQuality),
    ("code style", Domain::CodeQuality),
    ("style guide", Domain::CodeQuality),
    ("code quality", Domain::CodeQuality),
    ("clean code", Domain::CodeQuality),
    ("documentation", Domain::Documentation),
    ("docs", Domain::Documentation),
    ("readme", Domain::Documentation),
    ("tutorial", Domain::Documentation),
    ("tutorials", Domain::Documentation),
    ("docstring", Domain::Documentation),
    ("docstrings", Domain::Documentation),
    ("changelog", Domain::Documentation),
];

/// Capability keywords.
pub static CAPABILITY_KEYWORDS: &[(&str, Capability)] = &[
    ("create", Capability::Create),
    ("build", Capability::Create),
    ("generate", Capability::Create),
    ("make", Capability::Create),
    ("write", Capability::Create),
    ("scaffold", Capability::Create),
    ("implement", Capability::Create),
    ("develop", Capability::Create),
    ("analyze", Capability::Analyze),
    ("analyse", Capability::Analyze),
    ("analysis", Capability::Analyze),
    ("audit", Capability::Analyze),
    ("review", Capability::Analyze),
    ("inspect", Capability::Analyze),
    ("assess", Capability::Analyze),
    ("scan", Capability::Analyze),
    ("diagnose", Capability::Analyze),
    ("evaluate", Capability::Analyze),
    ("optimize", Capability::Optimize),
    ("optimise", Capability::Optimize),
    ("improve", Capability::Optimize),
    ("refactor", Capability::Optimize),
    ("speed up", Capability::Optimize),
    ("tune", Capability::Optimize),
    ("performance", Capability::Optimize),
    ("research", Capability::Research),
    ("investigate", Capability::Research),
    ("explore", Capability::Research),
    ("compare", Capability::Research),
    ("survey", Capability::Research),
    ("validate", Capability::Validate),
    ("verify", Capability::Validate),
    ("check", Capability::Validate),
    ("ensure", Capability::Validate),
    ("compliance", Capability::Validate),
    ("conformance", Capability::Validate),
    ("enforce", Capability::Validate),
    ("monitor", Capability::Monitor),
    ("watch", Capability::Monitor),
    ("track", Capability::Monitor),
    ("alert", Capability::Monitor),
    ("observe", Capability::Monitor),
    ("observability", Capability::Monitor),
];

/// Framework keywords mapped to their canonical name.
pub static FRAMEWORK_KEYWORDS: &[(&str, &str)] = &[
    ("react", "react"),
    ("reactjs", "react"),
    ("vue", "vue"),
    ("angular", "angular"),
    ("svelte", "svelte"),
    ("nextjs", "nextjs"),
    ("django", "django"),
    ("flask", "flask"),
    ("fastapi", "fastapi"),
    ("rails", "rails"),
    ("spring", "spring"),
    ("express", "express"),
    ("actix", "actix"),
    ("axum", "axum"),
    ("tokio", "tokio"),
    ("black", "black"),
    ("prettier", "prettier"),
    ("eslint", "eslint"),
    ("ruff", "ruff"),
    ("pytest", "pytest"),
    ("jest", "jest"),
    ("playwright", "playwright"),
    ("cypress", "cypress"),
    ("owasp", "owasp"),
    ("tensorflow", "tensorflow"),
    ("pytorch", "pytorch"),
    ("pandas", "pandas"),
    ("flutter", "flutter"),
    ("swiftui", "swiftui"),
];

/// Options offered by the tech-stack clarification question, in order.
pub static TECH_STACK_OPTIONS: &[&str] = &[
    "react", "django", "fastapi", "express", "spring", "axum", "flutter",
];

/// Vague phrases that signal an under-specified request.
pub static VAGUE_PHRASES: &[&str] = &[
    "my project",
    "my app",
    "my code",
    "my repo",
    "my stuff",
    "our project",
    "something",
    "stuff",
    "things",
    "help me",
    "some kind of",
    "whatever",
    "etc",
    "and so on",
    "general purpose",
    "various",
    "anything",
];

/// Action verbs whose object is inspected for coverage by the lexicons.
static ACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:handle|manage|deal with|take care of|work on|help with)\s+(?:my |the |our |some |all )?([a-z][a-z0-9\-]*)",
    )
    .expect("action pattern is a valid regex")
});

/// Word tokenizer: keeps `-`, `+` and `#` inside tokens (`full-stack`, `c++`).
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9][a-z0-9+#\-]*").expect("word pattern is a valid regex")
});

/// Lowercased word sequence of `text`, joined by single spaces and padded
/// so whole-word phrases can be matched with `contains(" phrase ")`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().trim_end_matches('-'))
        .collect();
    format!(" {} ", words.join(" "))
}

/// Whether a normalized text contains `phrase` as whole words.
pub fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {phrase} "))
}

/// Objects of action verbs found in `normalized` text.
pub fn action_objects(normalized: &str) -> Vec<(String, String)> {
    ACTION_PATTERN
        .captures_iter(normalized)
        .filter_map(|c| {
            let whole = c.get(0)?.as_str().trim().to_string();
            let object = c.get(1)?.as_str().to_string();
            Some((whole, object))
        })
        .collect()
}

/// Whether a single word is covered by any lexicon.
pub fn is_known_word(word: &str) -> bool {
    DOMAIN_KEYWORDS.iter().any(|(k, _)| *k == word)
        || CAPABILITY_KEYWORDS.iter().any(|(k, _)| *k == word)
        || FRAMEWORK_KEYWORDS.iter().any(|(k, _)| *k == word)
}

/// Knowledge modules loaded for a domain.
pub fn domain_modules(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Security => &["security/owasp-top-10", "security/threat-modeling"],
        Domain::Backend => &["backend/api-design", "backend/error-handling"],
        Domain::Frontend => &["frontend/component-design", "frontend/accessibility"],
        Domain::Database => &["database/schema-design", "database/query-tuning"],
        Domain::DevOps => &["devops/ci-cd", "devops/containers"],
        Domain::Testing => &["testing/test-strategy"],
        Domain::Data => &["data/pipelines"],
        Domain::Mobile => &["mobile/platform-guidelines"],
        Domain::CodeQuality => &["quality/style-guides"],
        Domain::Documentation => &["docs/technical-writing"],
        Domain::General => &[],
    }
}

/// Knowledge modules loaded for a capability.
pub fn capability_modules(capability: Capability) -> &'static [&'static str] {
    match capability {
        Capability::Create => &[],
        Capability::Analyze => &["analysis/static-review"],
        Capability::Optimize => &["analysis/profiling"],
        Capability::Research => &["research/source-evaluation"],
        Capability::Validate => &["quality/verification"],
        Capability::Monitor => &["ops/observability"],
    }
}

/// Knowledge module name for a framework.
pub fn framework_module(framework: &str) -> String {
    format!("frameworks/{framework}")
}

/// Domain a canonical framework belongs to.
pub fn framework_domain(framework: &str) -> Option<Domain> {
    let domain = match framework {
        "react" | "vue" | "angular" | "svelte" | "nextjs" => Domain::Frontend,
        "django" | "flask" | "fastapi" | "rails" | "spring" | "express" | "actix" | "axum"
        | "tokio" => Domain::Backend,
        "black" | "prettier" | "eslint" | "ruff" => Domain::CodeQuality,
        "pytest" | "jest" | "playwright" | "cypress" => Domain::Testing,
        "owasp" => Domain::Security,
        "tensorflow" | "pytorch" | "pandas" => Domain::Data,
        "flutter" | "swiftui" => Domain::Mobile,
        _ => return None,
    };
    Some(domain)
}

/// Alternate lookup names tried when the knowledge service does not know a
/// name.
pub fn synonyms(name: &str) -> &'static [&'static str] {
    match name {
        "security" => &["application security", "appsec"],
        "backend" => &["server-side development", "api design"],
        "frontend" => &["web ui development", "client-side development"],
        "database" => &["relational databases", "sql"],
        "DevOps" => &["continuous delivery", "infrastructure as code"],
        "testing" => &["software testing", "test automation"],
        "data" => &["data engineering", "data analysis"],
        "mobile" => &["mobile development", "app development"],
        "code quality" => &["static analysis", "code formatting"],
        "documentation" => &["technical writing", "docs"],
        "react" => &["reactjs", "react.js"],
        "nextjs" => &["next.js", "next"],
        "black" => &["black formatter", "psf black"],
        "django" => &["django framework", "django web"],
        "fastapi" => &["fast api", "fastapi python"],
        "owasp" => &["owasp top 10", "owasp asvs"],
        "pytest" => &["py.test", "pytest framework"],
        _ => &[],
    }
}

/// Built-in practices for a domain, used when no evidence was gathered.
pub fn domain_practices(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Security => &[
            "Treat all external input as untrusted and validate it at the boundary.",
            "Report findings with severity, location and a concrete remediation.",
            "Never print secrets or credentials in output.",
        ],
        Domain::Backend => &[
            "Keep handlers thin and move logic into testable functions.",
            "Return structured errors with stable codes.",
        ],
        Domain::Frontend => &[
            "Keep components small and driven by explicit props.",
            "Check keyboard navigation and contrast for every change.",
        ],
        Domain::Database => &[
            "Make schema migrations reversible.",
            "Check query plans before adding indexes.",
        ],
        Domain::DevOps => &[
            "Pin tool and image versions.",
            "Keep deployment steps idempotent.",
        ],
        Domain::Testing => &[
            "Prefer small deterministic tests over broad flaky ones.",
            "Name each test after the behavior it checks.",
        ],
        Domain::Data => &[
            "Record the source and version of every dataset.",
            "Validate schemas at pipeline boundaries.",
        ],
        Domain::Mobile => &[
            "Follow the platform design guidelines.",
            "Test on the oldest supported OS version.",
        ],
        Domain::CodeQuality => &[
            "Run the configured formatter instead of hand-editing style.",
            "Keep formatting changes separate from logic changes.",
        ],
        Domain::Documentation => &[
            "Lead with a working example.",
            "Keep each page focused on one task.",
        ],
        Domain::General => &[],
    }
}

/// Generic practices carried by a fallback evidence bundle.
pub static GENERIC_PRACTICES: &[&str] = &[
    "Read the existing code and conventions before changing anything.",
    "Prefer the smallest change that satisfies the request.",
    "Verify results with the project's own tools before reporting success.",
    "State assumptions explicitly when information is missing.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_hyphenated_words_and_pads() {
        assert_eq!(normalize("Full-Stack, API!"), " full-stack api ");
        assert_eq!(normalize(""), "  ");
    }

    #[test]
    fn phrases_match_whole_words_only() {
        let text = normalize("Write a unit test for the parser");
        assert!(contains_phrase(&text, "unit test"));
        assert!(contains_phrase(&text, "test"));
        assert!(!contains_phrase(&text, "tests"));
        assert!(!contains_phrase(&normalize("contest"), "test"));
    }

    #[test]
    fn action_objects_capture_the_object_word() {
        let text = normalize("Please handle the invoices and help with deployment");
        let objects = action_objects(&text);
        assert_eq!(
            objects,
            vec![
                ("handle the invoices".to_string(), "invoices".to_string()),
                ("help with deployment".to_string(), "deployment".to_string()),
            ]
        );
    }

    #[test]
    fn every_domain_but_general_has_modules_and_practices() {
        for domain in Domain::CLARIFIABLE {
            assert!(!domain_modules(domain).is_empty(), "{domain}");
            assert!(!domain_practices(domain).is_empty(), "{domain}");
        }
    }

    #[test]
    fn every_framework_belongs_to_a_domain() {
        for (_, canonical) in FRAMEWORK_KEYWORDS {
            assert!(framework_domain(canonical).is_some(), "{canonical}");
        }
        assert_eq!(framework_domain("django"), Some(Domain::Backend));
        assert_eq!(framework_domain("flutter"), Some(Domain::Mobile));
        assert_eq!(framework_domain("cobol"), None);
    }

    #[test]
    fn tech_stack_options_are_known_frameworks() {
        for option in TECH_STACK_OPTIONS {
            assert!(FRAMEWORK_KEYWORDS.iter().any(|(_, canonical)| canonical == option));
        }
    }
}
