mod common;

use std::sync::Arc;

use adneura::modules::images::dispatcher::{DispatchError, DispatchTarget, ImageDispatcher};
use adneura::modules::images::job::{audience_file_name, trigger_file_name, EntityKind};
use common::{audience, trigger, MemorySource, RecordingQueue};
use uuid::Uuid;

fn all_audiences() -> DispatchTarget {
    DispatchTarget::Audiences { audience_id: None }
}

fn dispatcher(source: Arc<MemorySource>, queue: Arc<RecordingQueue>) -> ImageDispatcher {
    ImageDispatcher::new(source, queue)
}

#[tokio::test]
async fn schedules_only_audiences_without_an_image() {
    let brand = Uuid::new_v4();
    let (a1, a2, a3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let source = Arc::new(MemorySource::with(
        brand,
        vec![
            audience(a1, Some("existing-1.png")),
            audience(a2, Some("existing-2.png")),
            audience(a3, None),
        ],
    ));
    let queue = Arc::new(RecordingQueue::default());

    let tickets = dispatcher(source, queue.clone())
        .dispatch(brand, all_audiences())
        .await
        .unwrap();

    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].entity_id, a3);

    let jobs = queue.jobs();
    assert_eq!(jobs.len(), 1);
    let (job_id, job) = &jobs[0];
    assert_eq!(*job_id, tickets[0].job_id);
    assert_eq!(job.entity_kind, EntityKind::Audience);
    assert_eq!(job.entity_id, a3);
    assert_eq!(job.file_name, audience_file_name(brand, a3));
    assert_eq!(job.prompt, format!("audience {a3}"));
}

#[tokio::test]
async fn scheduled_count_matches_entities_missing_images() {
    let brand = Uuid::new_v4();
    let candidates: Vec<_> = (0..7)
        .map(|i| {
            let image = (i % 3 == 0).then_some("done.png");
            audience(Uuid::new_v4(), image)
        })
        .collect();
    let missing = candidates.iter().filter(|c| c.needs_image()).count();
    let queue = Arc::new(RecordingQueue::default());

    let tickets = dispatcher(Arc::new(MemorySource::with(brand, candidates)), queue.clone())
        .dispatch(brand, all_audiences())
        .await
        .unwrap();

    assert_eq!(missing, 4);
    assert_eq!(tickets.len(), missing);
    assert_eq!(queue.jobs().len(), missing);
}

#[tokio::test]
async fn blank_reference_counts_as_missing() {
    let brand = Uuid::new_v4();
    let id = Uuid::new_v4();
    let queue = Arc::new(RecordingQueue::default());

    let tickets = dispatcher(
        Arc::new(MemorySource::with(brand, vec![audience(id, Some("  "))])),
        queue,
    )
    .dispatch(brand, all_audiences())
    .await
    .unwrap();

    assert_eq!(tickets.len(), 1);
}

#[tokio::test]
async fn redispatch_after_completion_schedules_nothing() {
    let brand = Uuid::new_v4();
    let id = Uuid::new_v4();
    let source = Arc::new(MemorySource::with(brand, vec![audience(id, None)]));
    let queue = Arc::new(RecordingQueue::default());
    let dispatcher = dispatcher(source.clone(), queue.clone());

    let first = dispatcher.dispatch(brand, all_audiences()).await.unwrap();
    source.set_image(id, &first[0].file_name);
    let second = dispatcher.dispatch(brand, all_audiences()).await.unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(queue.jobs().len(), 1);
}

#[tokio::test]
async fn redispatch_before_completion_schedules_duplicates() {
    let brand = Uuid::new_v4();
    let id = Uuid::new_v4();
    let queue = Arc::new(RecordingQueue::default());
    let dispatcher = dispatcher(
        Arc::new(MemorySource::with(brand, vec![audience(id, None)])),
        queue.clone(),
    );

    dispatcher.dispatch(brand, all_audiences()).await.unwrap();
    dispatcher.dispatch(brand, all_audiences()).await.unwrap();

    let jobs = queue.jobs();
    assert_eq!(jobs.len(), 2);
    assert_ne!(jobs[0].0, jobs[1].0);
    assert_eq!(jobs[0].1, jobs[1].1);
}

#[tokio::test]
async fn audience_filter_limits_to_one_entity() {
    let brand = Uuid::new_v4();
    let (a1, a2) = (Uuid::new_v4(), Uuid::new_v4());
    let queue = Arc::new(RecordingQueue::default());

    let tickets = dispatcher(
        Arc::new(MemorySource::with(brand, vec![audience(a1, None), audience(a2, None)])),
        queue,
    )
    .dispatch(brand, DispatchTarget::Audiences { audience_id: Some(a2) })
    .await
    .unwrap();

    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].entity_id, a2);
}

#[tokio::test]
async fn trigger_jobs_encode_audience_and_trigger() {
    let brand = Uuid::new_v4();
    let audience_id = Uuid::new_v4();
    let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
    let queue = Arc::new(RecordingQueue::default());
    let source = MemorySource::with(
        brand,
        vec![
            audience(audience_id, None),
            trigger(t1, audience_id, None),
            trigger(t2, audience_id, Some("t2.png")),
        ],
    );

    let tickets = dispatcher(Arc::new(source), queue.clone())
        .dispatch(brand, DispatchTarget::Triggers { trigger_id: None })
        .await
        .unwrap();

    assert_eq!(tickets.len(), 1);
    let (_, job) = &queue.jobs()[0];
    assert_eq!(job.entity_kind, EntityKind::Trigger);
    assert_eq!(job.entity_id, t1);
    assert_eq!(job.file_name, trigger_file_name(brand, audience_id, t1));
}

#[tokio::test]
async fn brand_without_entities_is_not_found() {
    let brand = Uuid::new_v4();
    let other_brand = Uuid::new_v4();
    let queue = Arc::new(RecordingQueue::default());
    let source = MemorySource::with(other_brand, vec![audience(Uuid::new_v4(), None)]);

    let err = dispatcher(Arc::new(source), queue.clone())
        .dispatch(brand, all_audiences())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::NotFound { kind: EntityKind::Audience, brand_id } if brand_id == brand
    ));
    assert!(queue.jobs().is_empty());
}

#[tokio::test]
async fn queue_failure_is_raised_to_the_caller() {
    let brand = Uuid::new_v4();
    let source = MemorySource::with(brand, vec![audience(Uuid::new_v4(), None)]);

    let err = dispatcher(Arc::new(source), Arc::new(RecordingQueue::broken()))
        .dispatch(brand, all_audiences())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Queue(_)));
}
