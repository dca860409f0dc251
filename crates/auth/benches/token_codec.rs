use chrono::{Duration, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use warden_auth::permissions::ALL;
use warden_auth::roles::SEEDED_ROLES;
use warden_auth::{Authorities, RoleName, TokenCodec, resolve_roles_for_creation};

fn bench_token_roundtrip(c: &mut Criterion) {
    let codec = TokenCodec::new(b"bench-signing-key-0123456789abcdef", Duration::hours(1)).unwrap();
    let now = Utc::now();
    let token = codec.issue("bench", &SEEDED_ROLES, &ALL, now).unwrap();

    let mut group = c.benchmark_group("token_codec");
    group.sample_size(500);

    group.bench_function("issue_full_authorities", |b| {
        b.iter(|| codec.issue(black_box("bench"), &SEEDED_ROLES, &ALL, now).unwrap())
    });

    group.bench_function("verify_full_authorities", |b| {
        b.iter(|| codec.verify(black_box(&token), now).unwrap())
    });

    group.finish();
}

fn bench_privilege_resolution(c: &mut Criterion) {
    let caller = Authorities::new("bench", [RoleName::ADMIN, RoleName::ACADEMIC_EDITOR], []);
    let requested = SEEDED_ROLES.to_vec();

    c.bench_function("resolve_roles_for_creation", |b| {
        b.iter(|| resolve_roles_for_creation(black_box(&caller), &requested))
    });
}

criterion_group!(benches, bench_token_roundtrip, bench_privilege_resolution);
criterion_main!(benches);
