//! End-to-end analysis of one transcript.
//!
//! # Error Handling Strategy
//!
//! - **Fatal**: an unrecognized export or invalid configuration stops the run
//!   before any scoring happens. Cancellation also aborts, discarding all
//!   intermediate results.
//!
//! - **Degraded**: identity ambiguities, unresolved honorees and collaborator
//!   failures (classifier or progress reporter) become [`AnalysisWarning`]s.
//!   Warnings about one entity are attached to it; the rest go on the report.
//!
//! - **Filtered**: entities below `confidence.min_threshold` are moved to
//!   [`AnalysisReport::rejected`], never reported as errors.

pub mod cancel;
pub mod report;

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use crate::clustering::{
    ScoredTranscript, build_clusters, entity_date, group_by_calendar_day, merge_same_target,
    partition_by_target,
};
use crate::collaborators::{
    NoProgress, ProgressEvent, ProgressReporter, Stage, WishClassifier, build_request,
    classify_with_retry,
};
use crate::confidence::ConfidenceScorer;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::identity::ParticipantRegistry;
use crate::models::{
    AnalysisWarning, BirthdayCluster, BirthdayEntity, EvidenceItem, IdentityId, MonthDay,
    Occurrence, TargetRef,
};
use crate::parsers::parse_transcript;
use crate::resolver::{ClusterResolution, TargetResolver};
use crate::scoring::{
    MentionExtractor, WishScorer, mark_thanks_responses, phone_references, score_messages,
};

pub use cancel::CancellationToken;
pub use report::{AnalysisReport, AnalysisStats};

static NO_PROGRESS: NoProgress = NoProgress;

/// Optional services for a run
pub struct Collaborators<'a> {
    pub classifier: Option<&'a dyn WishClassifier>,
    pub progress: &'a dyn ProgressReporter,
    pub cancel: CancellationToken,
}

impl Default for Collaborators<'_> {
    fn default() -> Self {
        Self { classifier: None, progress: &NO_PROGRESS, cancel: CancellationToken::new() }
    }
}

/// Accepted birthday entities for `text`, best first
pub fn analyze(text: &str, config: &AnalysisConfig) -> Result<Vec<BirthdayEntity>, AnalysisError> {
    analyze_with(text, config, &Collaborators::default()).map(|report| report.entities)
}

/// Collects warnings about collaborators without repeating identical ones
#[derive(Default)]
struct WarningLog(Vec<AnalysisWarning>);

impl WarningLog {
    fn push(&mut self, warning: AnalysisWarning) {
        if !self.0.contains(&warning) {
            self.0.push(warning);
        }
    }
}

fn emit(progress: &dyn ProgressReporter, event: ProgressEvent, warnings: &mut WarningLog) {
    if let Err(e) = progress.report(&event) {
        warn!(error = %e, "Progress reporter failed");
        warnings.push(AnalysisWarning::CollaboratorUnavailable {
            collaborator: "progress".to_string(),
            reason: e.to_string(),
        });
    }
}

/// Run every stage and return the full report
pub fn analyze_with(
    text: &str,
    config: &AnalysisConfig,
    collaborators: &Collaborators<'_>,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;
    let cancel = &collaborators.cancel;
    let progress = collaborators.progress;
    let mut log = WarningLog::default();

    // Parse
    let transcript = parse_transcript(text, &config.parser)?;
    let messages = &transcript.messages;
    emit(progress, ProgressEvent::StageCompleted { stage: Stage::Parse, items: messages.len() }, &mut log);
    cancel.check()?;

    // Registry
    let registry = ParticipantRegistry::from_config(config)?;
    let mut senders: Vec<Option<IdentityId>> = Vec::with_capacity(messages.len());
    for message in messages {
        if message.sender.is_empty() {
            for (raw, _) in phone_references(&message.body) {
                if let Some(id) = registry.resolve_phone(&raw) {
                    registry.record_sighting(id, message.index, false);
                }
            }
            senders.push(None);
            continue;
        }
        let id = registry.resolve_or_create(&message.sender, None);
        registry.record_sighting(id, message.index, true);
        senders.push(Some(id));
    }
    emit(progress, ProgressEvent::StageCompleted { stage: Stage::Registry, items: registry.len() }, &mut log);
    cancel.check()?;

    // Scoring
    let scorer = WishScorer::new(&config.scoring)?;
    let mut signals = score_messages(&scorer, messages);
    let extractor = MentionExtractor::new(&registry, &config.scoring);
    for (message, signal) in messages.iter().zip(signals.iter_mut()) {
        if signal.is_wish || signal.gratitude {
            extractor.extract(message, senders[message.index], signal);
        }
    }
    let senders: Vec<Option<IdentityId>> =
        senders.into_iter().map(|s| s.map(|id| registry.canonical(id))).collect();
    let thanks = mark_thanks_responses(messages, &senders, &mut signals, config.scoring.thanks_window_hours);
    let wishes = signals.iter().filter(|s| s.is_wish).count();
    debug!(wishes, thanks, "Scored messages");
    emit(progress, ProgressEvent::StageCompleted { stage: Stage::Scoring, items: wishes }, &mut log);
    cancel.check()?;

    // Clustering
    let scored = ScoredTranscript { messages, signals: &signals, senders: &senders };
    let participant_count = registry.senders().len();
    let clusters = build_clusters(&scored, &config.clustering, participant_count);
    emit(progress, ProgressEvent::StageCompleted { stage: Stage::Clustering, items: clusters.len() }, &mut log);
    cancel.check()?;

    // Resolution
    let resolver = TargetResolver::new(&registry, &config.resolver);
    let mut resolutions: Vec<ClusterResolution> = Vec::with_capacity(clusters.len());
    for cluster in &clusters {
        let resolution = resolver.resolve(cluster, scored);
        emit(
            progress,
            ProgressEvent::ClusterResolved { cluster_id: cluster.id, target: resolution.target },
            &mut log,
        );
        resolutions.push(resolution);
    }
    emit(progress, ProgressEvent::StageCompleted { stage: Stage::Resolution, items: resolutions.len() }, &mut log);
    cancel.check()?;

    // Classification
    if let Some(classifier) = collaborators.classifier {
        let mut judged = 0usize;
        for (cluster, resolution) in clusters.iter().zip(resolutions.iter_mut()) {
            cancel.check()?;
            let request = build_request(cluster, &scored);
            match classify_with_retry(classifier, &request, &config.classifier, cancel) {
                Ok(judgment) if judgment.is_wish => {
                    let identity = judgment.target_name.as_deref().and_then(|name| {
                        match registry.find_by_name_fragment(name).as_slice() {
                            [only] => Some(*only),
                            _ => None,
                        }
                    });
                    resolution.evidence.push(EvidenceItem::Classifier {
                        cluster_id: cluster.id,
                        identity,
                        target_name: judgment.target_name,
                        confidence: judgment.confidence,
                        rationale: judgment.rationale,
                    });
                    judged += 1;
                }
                Ok(_) => judged += 1,
                Err(e) => {
                    cancel.check()?;
                    warn!(cluster = cluster.id, error = %e, "Classifier unavailable");
                    log.push(AnalysisWarning::CollaboratorUnavailable {
                        collaborator: classifier.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        emit(progress, ProgressEvent::StageCompleted { stage: Stage::Classification, items: judged }, &mut log);
    }

    // Cross-year merge
    let targets: Vec<Option<IdentityId>> = resolutions.iter().map(|r| r.target).collect();
    let tolerance = config.clustering.date_tolerance_days;
    let partitions = group_by_calendar_day(&clusters, tolerance)
        .iter()
        .flat_map(|group| partition_by_target(group, &targets))
        .collect();
    let mut entities: Vec<_> = merge_same_target(partitions, &clusters, tolerance)
        .into_iter()
        .map(|(target, members)| assemble_entity(target, &members, &clusters, &resolutions, &registry))
        .collect();
    emit(progress, ProgressEvent::StageCompleted { stage: Stage::Merging, items: entities.len() }, &mut log);
    cancel.check()?;

    // Confidence
    let scorer = ConfidenceScorer::new(
        &config.confidence,
        config.resolver.name_dominance_margin,
        &config.classifier,
    );
    for entity in &mut entities {
        let breakdown = scorer.score(entity.target_id(), &entity.occurrences, &entity.evidence);
        entity.confidence = breakdown.confidence;
        entity.breakdown = breakdown;
    }
    entities.sort_by(compare_entities);
    let (accepted, rejected): (Vec<_>, Vec<_>) =
        entities.into_iter().partition(|e| e.breakdown.accepted);
    emit(progress, ProgressEvent::StageCompleted { stage: Stage::Confidence, items: accepted.len() }, &mut log);
    cancel.check()?;

    let mut warnings: Vec<AnalysisWarning> = registry
        .notes()
        .into_iter()
        .map(|note| AnalysisWarning::AmbiguousIdentity { detail: note.detail, identities: note.identities })
        .collect();
    warnings.extend(log.0);

    let stats = AnalysisStats {
        messages: messages.len(),
        text_messages: transcript.text_messages().count(),
        orphan_lines: transcript.orphan_lines,
        wishes,
        thanks_responses: thanks,
        clusters: clusters.len(),
        entities: accepted.len(),
        rejected: rejected.len(),
    };
    info!(
        clusters = stats.clusters,
        accepted = stats.entities,
        rejected = stats.rejected,
        warnings = warnings.len(),
        "Analysis complete"
    );

    Ok(AnalysisReport {
        format: transcript.format,
        entities: accepted,
        rejected,
        warnings,
        participants: registry.identities(),
        stats,
    })
}

fn assemble_entity(
    target: Option<IdentityId>,
    members: &[usize],
    clusters: &[BirthdayCluster],
    resolutions: &[ClusterResolution],
    registry: &ParticipantRegistry,
) -> BirthdayEntity {
    let mut occurrences = Vec::with_capacity(members.len());
    let mut evidence = Vec::new();
    let mut warnings: Vec<AnalysisWarning> = Vec::new();

    for &m in members {
        let resolution = &resolutions[m];
        occurrences.push(Occurrence {
            cluster: clusters[m].clone(),
            target: resolution.target,
            decided_by: resolution.decided_by,
            strategies: resolution.strategies.clone(),
        });
        evidence.extend(resolution.evidence.iter().cloned());
        warnings.extend(resolution.warnings.iter().cloned());
    }

    if let Some(target) = target {
        for note in registry.notes() {
            if note.identities.contains(&target) {
                warnings.push(AnalysisWarning::AmbiguousIdentity {
                    detail: note.detail,
                    identities: note.identities,
                });
            }
        }
    }

    let dates: Vec<MonthDay> =
        occurrences.iter().map(|o| MonthDay::from_date(o.cluster.birthday_date)).collect();
    let date = entity_date(&dates)
        .or_else(|| dates.first().copied())
        .unwrap_or(MonthDay { month: 1, day: 1 });

    let target = target.and_then(|id| registry.identity(id)).map(|identity| TargetRef {
        id: identity.id,
        key: identity.key.to_string(),
        display_name: identity.display_name,
    });

    BirthdayEntity {
        date,
        occurrences,
        target,
        evidence,
        confidence: 0.0,
        breakdown: Default::default(),
        warnings,
    }
}

/// Best first: confidence, then calendar date, then target key
fn compare_entities(a: &BirthdayEntity, b: &BirthdayEntity) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| {
            let key = |e: &BirthdayEntity| e.target.as_ref().map(|t| t.key.clone());
            key(a).cmp(&key(b))
        })
        .then_with(|| {
            let first = |e: &BirthdayEntity| e.occurrences.first().map(|o| o.cluster.id);
            first(a).cmp(&first(b))
        })
}
