//! End-to-end pipeline runs: request text in, outcome out.

use std::sync::Arc;

use forge_core::evidence::fakes::MemoryKnowledgeSource;
use forge_core::{
    validate_document, Capability, Domain, ExecutionTier, FailureKind, ForgeConfig, GateName,
    KnowledgeSource, Pipeline, QuestionKind, RunStatus, Thresholds, METRICS,
};

const FORMATTER: &str = "Create an agent that formats Python code using Black";
const VAGUE: &str = "Create an agent for my project";
const SECURITY_AUDIT: &str =
    "full-stack security audit with OWASP compliance and vulnerability research";

fn pipeline() -> Pipeline {
    Pipeline::new(ForgeConfig::default())
}

#[tokio::test]
async fn formatter_request_is_a_small_approved_agent() {
    let outcome = pipeline().generate(FORMATTER, None, false).await;

    assert_eq!(outcome.status, RunStatus::Approved, "{:?}", outcome.diagnostics);
    let classification = outcome.classification.as_ref().unwrap();
    assert_eq!(classification.domain.primary_domain, Domain::CodeQuality);
    assert_eq!(classification.capabilities.names(), vec!["create"]);
    assert_eq!(outcome.complexity_score.unwrap().value(), 2);

    let plan = outcome.resource_plan.as_ref().unwrap();
    assert_eq!(plan.execution_tier, ExecutionTier::T1);
    assert_eq!(
        plan.permission_names(),
        vec!["read", "search", "write", "execute"]
    );
    assert!(!plan.research_needed);
    assert!(outcome.evidence.is_none());

    let artifact = outcome.artifact.as_ref().unwrap();
    assert_eq!(artifact.metadata_text("name"), Some("code-quality-create-agent"));
    assert_eq!(artifact.metadata_text("execution_tier"), Some("T1"));
    let headings: Vec<&str> = artifact.sections.iter().map(|s| s.heading.as_str()).collect();
    assert_eq!(headings, vec!["Role", "Capabilities", "Workflow", "Constraints"]);

    let report = outcome.validation_report.as_ref().unwrap();
    assert!(report.passed());
    assert_eq!(report.results.len(), 4);
    assert_eq!(outcome.repair_attempts, 0);
    assert_eq!(outcome.artifact_digest.as_ref().map(String::len), Some(64));
    assert!(outcome.continuation.is_none());
    assert!(outcome.diagnostics.is_none());
}

#[tokio::test]
async fn vague_request_asks_for_domain_and_capability() {
    let outcome = pipeline().generate(VAGUE, None, false).await;

    assert_eq!(outcome.status, RunStatus::NeedsClarification);
    assert!(outcome.classification.as_ref().unwrap().domain.confidence < 0.2);
    let kinds: Vec<QuestionKind> = outcome.questions.iter().map(|q| q.kind).collect();
    assert_eq!(kinds, vec![QuestionKind::Domain, QuestionKind::Capability]);

    let continuation = outcome.continuation.as_ref().unwrap();
    assert_eq!(continuation.run_id, outcome.run_id);
    assert_eq!(continuation.rounds, 1);
    assert_eq!(continuation.questions, outcome.questions);

    assert!(outcome.artifact.is_none());
    assert!(outcome.resource_plan.is_none());
    assert!(outcome.diagnostics.is_none());
}

#[tokio::test]
async fn security_audit_is_deep_and_falls_back_without_a_source() {
    let outcome = pipeline().generate(SECURITY_AUDIT, None, false).await;

    assert_eq!(outcome.status, RunStatus::Approved, "{:?}", outcome.diagnostics);
    let classification = outcome.classification.as_ref().unwrap();
    assert_eq!(classification.domain.primary_domain, Domain::Security);
    assert!(classification.capabilities.contains(Capability::Analyze));
    assert!(classification.capabilities.contains(Capability::Research));
    assert!(outcome.complexity_score.unwrap().value() >= 8);

    let plan = outcome.resource_plan.as_ref().unwrap();
    assert_eq!(plan.execution_tier, ExecutionTier::T3);
    assert!(plan.research_needed);

    let evidence = outcome.evidence.as_ref().unwrap();
    assert!(evidence.is_fallback);
    assert_eq!(evidence.quality_score, 0.5);
    assert!(evidence.source_refs.is_empty());

    let artifact = outcome.artifact.as_ref().unwrap();
    let research = artifact.section("Research Evidence").unwrap();
    assert!(research.body.contains("Evidence mode: fallback."));
    assert!(artifact.section("Escalation").is_some());
}

#[tokio::test]
async fn security_audit_uses_retrieved_practices() {
    let source = MemoryKnowledgeSource::new()
        .with_document(
            "security",
            "/owasp/cheatsheets",
            "- Validate every input at the trust boundary\n\
             - Never log credentials or session tokens\n\
             You should review third-party dependencies for known vulnerabilities.",
        )
        .with_document(
            "owasp",
            "/owasp/top10",
            "1. Enforce access control on the server\n2. Encrypt sensitive data in transit",
        );
    let source: Arc<dyn KnowledgeSource> = Arc::new(source);
    let pipeline = Pipeline::with_knowledge_source(ForgeConfig::default(), source);

    let outcome = pipeline.generate(SECURITY_AUDIT, None, false).await;

    assert_eq!(outcome.status, RunStatus::Approved, "{:?}", outcome.diagnostics);
    let evidence = outcome.evidence.as_ref().unwrap();
    assert!(!evidence.is_fallback);
    assert_eq!(evidence.targets_attempted, 2);
    assert_eq!(evidence.targets_succeeded, 2);
    assert_eq!(evidence.practices.len(), 5);
    // 0.5 * (2/2) + 0.5 * (5/10)
    assert!((evidence.quality_score - 0.75).abs() < 1e-6);

    let artifact = outcome.artifact.as_ref().unwrap();
    let research = &artifact.section("Research Evidence").unwrap().body;
    assert!(research.contains("Evidence mode: retrieved."));
    assert!(research.contains("- Never log credentials or session tokens"));
    assert!(research.contains("security (/owasp/cheatsheets)"));
}

#[tokio::test]
async fn artifact_without_name_stops_at_structure() {
    let outcome = pipeline().generate(FORMATTER, None, false).await;
    let mut artifact = outcome.artifact.unwrap();
    artifact.metadata.remove("name");
    let document = artifact.render().unwrap();

    let report = validate_document(&document, None, &Thresholds::default());

    assert!(!report.passed());
    let structure = report.gate(GateName::Structure).unwrap();
    assert!(!structure.passed);
    assert_eq!(structure.issues[0].message, "missing field: name");
    assert!(report.gate(GateName::Content).is_none());
    assert!(report.gate(GateName::Quality).is_none());
}

#[tokio::test]
async fn unreachable_quality_exhausts_repairs() {
    let mut config = ForgeConfig::default();
    config.thresholds.min_section_words = 500;
    let before = METRICS.repairs_attempted();

    let outcome = Pipeline::new(config).generate(FORMATTER, None, false).await;

    assert_eq!(outcome.status, RunStatus::Rejected);
    assert_eq!(outcome.repair_attempts, 2);
    assert!(METRICS.repairs_attempted() >= before + 2);
    let diagnostics = outcome.diagnostics.as_ref().unwrap();
    assert_eq!(diagnostics.kind, FailureKind::ValidationFailure);
    assert!(diagnostics
        .issues
        .iter()
        .any(|i| i.starts_with("quality score")));

    // The rejected artifact is still reported, together with its report.
    let report = outcome.validation_report.as_ref().unwrap();
    assert_eq!(report.first_failure().unwrap().gate, GateName::Quality);
    let role = &outcome.artifact.as_ref().unwrap().section("Role").unwrap().body;
    assert!(role.contains("Stay inside the stated domain"));
}

#[tokio::test]
async fn speed_critical_picks_the_fast_model() {
    let outcome = pipeline().generate(SECURITY_AUDIT, None, true).await;
    let plan = outcome.resource_plan.unwrap();
    assert_eq!(plan.model.as_str(), "fast");
    // Research was asked for explicitly, so it still runs.
    assert!(plan.research_needed);
}

#[tokio::test]
async fn oversized_request_is_rejected() {
    let text = "build ".repeat(500);
    let outcome = pipeline().generate(&text, None, false).await;
    assert_eq!(outcome.status, RunStatus::Rejected);
    assert_eq!(
        outcome.diagnostics.unwrap().kind,
        FailureKind::InvalidRequest
    );
}

#[tokio::test]
async fn scores_and_permissions_hold_for_assorted_requests() {
    let requests = [
        FORMATTER,
        SECURITY_AUDIT,
        "Build a REST API in FastAPI backed by Postgres",
        "Monitor Kubernetes deployments and optimize the CI pipeline",
        "Write documentation for the React component library",
        "Analyze, research, validate and optimize a Django, React, Flutter and Spring monorepo",
    ];
    for text in requests {
        let outcome = pipeline().generate(text, None, false).await;
        let Some(score) = outcome.complexity_score else {
            continue;
        };
        assert!((1..=10).contains(&score.value()), "{text}: {score}");
        let plan = outcome.resource_plan.unwrap();
        assert_eq!(plan.execution_tier, ExecutionTier::for_score(score), "{text}");
        let permissions = plan.permission_names();
        assert!(permissions.contains(&"read".to_string()), "{text}");
        assert!(permissions.contains(&"search".to_string()), "{text}");

        if let Some(report) = outcome.validation_report {
            let first_failure = report.results.iter().position(|r| !r.passed);
            if let Some(index) = first_failure {
                assert_eq!(report.results.len(), index + 1, "{text}");
            }
        }
    }
}

#[tokio::test]
async fn frameworks_alone_are_enough_to_classify() {
    let outcome = pipeline()
        .generate(
            "Analyze, research, validate and optimize a Django, React, Flutter and Spring monorepo",
            None,
            false,
        )
        .await;

    assert_ne!(outcome.status, RunStatus::NeedsClarification);
    assert!(outcome.questions.is_empty());
    let classification = outcome.classification.as_ref().unwrap();
    assert_eq!(classification.domain.primary_domain, Domain::Backend);
    assert_eq!(
        classification.domain.secondary_domains,
        vec![Domain::Frontend, Domain::Mobile]
    );
    assert_eq!(outcome.complexity_score.unwrap().value(), 10);
    assert_eq!(
        outcome.resource_plan.as_ref().unwrap().execution_tier,
        ExecutionTier::T3
    );
}

#[tokio::test]
async fn regeneration_is_deterministic() {
    let first = pipeline().generate(FORMATTER, None, false).await;
    let second = pipeline().generate(FORMATTER, None, false).await;
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.artifact_digest, second.artifact_digest);
    assert_eq!(first.artifact, second.artifact);
}

#[tokio::test]
async fn outcome_serializes_with_screaming_status() {
    let outcome = pipeline().generate(VAGUE, None, false).await;
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "NEEDS_CLARIFICATION");
    assert!(json.get("artifact").is_none());
    assert_eq!(json["questions"].as_array().unwrap().len(), 2);
}
