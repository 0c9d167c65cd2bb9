use vibe_settings::prelude::*;

#[test]
fn repeating_task_fires_each_interval() {
    let mut q = TaskQueue::default();
    let id = q.schedule_repeating(0.0, 2.0);
    assert!(q.poll(1.9).is_empty());
    assert_eq!(q.poll(2.0), vec![id]);
    assert!(q.poll(3.0).is_empty());
    assert_eq!(q.poll(4.0), vec![id]);
}

#[test]
fn late_poll_reenqueues_from_poll_time() {
    let mut q = TaskQueue::default();
    let id = q.schedule_repeating(0.0, 2.0);
    assert_eq!(q.poll(2.5), vec![id]);
    assert_eq!(q.next_due(id), Some(4.5));
    assert!(q.poll(4.0).is_empty());
}

#[test]
fn cancelled_task_never_fires() {
    let mut q = TaskQueue::default();
    let a = q.schedule_repeating(0.0, 1.0);
    let b = q.schedule_repeating(0.0, 1.0);
    assert!(q.cancel(a));
    assert!(!q.cancel(a));
    assert!(!q.is_scheduled(a));
    assert_eq!(q.poll(1.0), vec![b]);
    assert_eq!(q.len(), 1);
}
