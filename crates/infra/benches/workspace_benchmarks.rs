use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{NaiveDate, Utc};
use teamspace_auth::{
    decide, Action, Claims, Hs256TokenCodec, ProjectAction, ResourceRef, Role, TenantAction,
    TokenCodec, UserAction,
};
use teamspace_core::{ProjectId, TaskId, TenantId, UserId};
use teamspace_projects::{Task, TaskPriority, TaskStatus};
use teamspace_tenancy::Admission;

fn member_claims(tenant_id: TenantId) -> Claims {
    Claims::new(UserId::new(), Some(tenant_id), Role::User)
}

fn admin_claims(tenant_id: TenantId) -> Claims {
    Claims::new(UserId::new(), Some(tenant_id), Role::TenantAdmin)
}

fn operator_claims() -> Claims {
    Claims::new(UserId::new(), None, Role::SuperAdmin)
}

fn bench_authorization_decision_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorization_decision_latency");
    group.sample_size(1000);

    // Allow path: a member reading a project in their own tenant.
    group.bench_function("member_reads_own_project", |b| {
        let tenant_id = TenantId::new();
        let claims = member_claims(tenant_id);
        let resource = ResourceRef::project(tenant_id, Some(claims.sub));
        b.iter(|| {
            black_box(decide(
                black_box(&claims),
                Action::Project(ProjectAction::Read),
                black_box(&resource),
            ))
        });
    });

    // Deny path: the tenant boundary fires before any role gate.
    group.bench_function("cross_tenant_read_denied", |b| {
        let claims = member_claims(TenantId::new());
        let resource = ResourceRef::project(TenantId::new(), None);
        b.iter(|| {
            black_box(decide(
                black_box(&claims),
                Action::Project(ProjectAction::Read),
                black_box(&resource),
            ))
        });
    });

    // Operator path: the boundary exemption plus a super-only gate.
    group.bench_function("operator_updates_subscription", |b| {
        let claims = operator_claims();
        let resource = ResourceRef::in_tenant(TenantId::new());
        b.iter(|| {
            black_box(decide(
                black_box(&claims),
                Action::Tenant(TenantAction::UpdateSubscription),
                black_box(&resource),
            ))
        });
    });

    // Deepest gate: role escalation is checked before the admin gate.
    group.bench_function("admin_role_grant_check", |b| {
        let tenant_id = TenantId::new();
        let claims = admin_claims(tenant_id);
        let resource = ResourceRef::user(Some(tenant_id), UserId::new());
        b.iter(|| {
            black_box(decide(
                black_box(&claims),
                Action::User(UserAction::UpdateRole {
                    to: Role::TenantAdmin,
                }),
                black_box(&resource),
            ))
        });
    });

    group.finish();
}

fn bench_quota_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("quota_admission");
    group.sample_size(1000);

    group.bench_function("under_limit", |b| {
        b.iter(|| black_box(Admission::evaluate(black_box(3), black_box(5))));
    });

    group.bench_function("at_limit", |b| {
        b.iter(|| black_box(Admission::evaluate(black_box(5), black_box(5))));
    });

    group.finish();
}

fn make_board(tenant_id: TenantId, project_id: ProjectId, count: usize) -> Vec<Task> {
    let priorities = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];
    (0..count)
        .map(|i| {
            let due_date = if i % 4 == 0 {
                None
            } else {
                NaiveDate::from_ymd_opt(2026, 1 + (i % 12) as u32, 1 + (i % 28) as u32)
            };
            let now = Utc::now();
            Task {
                id: TaskId::new(),
                project_id,
                tenant_id,
                title: format!("task {i}"),
                description: None,
                status: TaskStatus::Todo,
                priority: priorities[i % 3],
                assigned_to: None,
                due_date,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}

fn bench_board_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("board_ordering");

    for task_count in [10, 100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*task_count as u64));
        group.bench_with_input(
            BenchmarkId::new("sort_listing", task_count),
            task_count,
            |b, &count| {
                let tenant_id = TenantId::new();
                let project_id = ProjectId::new();
                let board = make_board(tenant_id, project_id, count);

                b.iter(|| {
                    let mut tasks = board.clone();
                    tasks.sort_by(Task::listing_order);
                    black_box(tasks);
                });
            },
        );
    }

    group.finish();
}

fn bench_token_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_codec");
    group.sample_size(1000);

    let codec = Hs256TokenCodec::new(b"benchmark-secret");
    let claims = member_claims(TenantId::new());

    group.bench_function("sign_claims", |b| {
        b.iter(|| black_box(codec.sign(black_box(&claims)).unwrap()));
    });

    group.bench_function("verify_token", |b| {
        let signed = codec.sign(&claims).unwrap();
        b.iter(|| black_box(codec.verify(black_box(&signed.token)).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_authorization_decision_latency,
    bench_quota_admission,
    bench_board_ordering,
    bench_token_codec
);
criterion_main!(benches);
