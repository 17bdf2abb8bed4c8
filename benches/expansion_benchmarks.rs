//! Benchmarks for group expansion
//!
//! Run with: cargo bench
//!
//! Directories are synthetic and in memory, so the numbers measure traversal
//! and role aggregation only.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gsuite_role_sync::{
    Directory, GroupResolver, GroupRoleMapping, Member, ResolverConfig, Result,
    RoleAttributeUpdate, SyncError,
};
use std::collections::HashMap;
use std::sync::Arc;

struct SyntheticDirectory {
    groups: HashMap<String, Vec<Member>>,
}

#[async_trait]
impl Directory for SyntheticDirectory {
    async fn list_members(&self, group: &str) -> Result<Vec<Member>> {
        self.groups
            .get(group)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(group.to_string()))
    }

    async fn primary_email(&self, user: &str) -> Result<Option<String>> {
        Ok(Some(user.to_string()))
    }

    async fn update_user(&self, _user: &str, _update: &RoleAttributeUpdate) -> Result<()> {
        Ok(())
    }
}

/// Chain of `depth` nested groups, each with `users_per_group` users
fn chain_directory(depth: usize, users_per_group: usize) -> SyntheticDirectory {
    let mut groups = HashMap::new();
    for level in 0..depth {
        let mut members: Vec<Member> = (0..users_per_group)
            .map(|u| Member::user(format!("user-{level}-{u}@example.com")))
            .collect();
        if level + 1 < depth {
            members.push(Member::group(format!("group-{}@example.com", level + 1)));
        }
        groups.insert(format!("group-{level}@example.com"), members);
    }
    SyntheticDirectory { groups }
}

/// `width` independent top-level groups sharing one large group
fn shared_directory(width: usize, shared_users: usize) -> (SyntheticDirectory, GroupRoleMapping) {
    let mut groups = HashMap::new();
    let mut mapping = GroupRoleMapping::new();

    let shared: Vec<Member> = (0..shared_users)
        .map(|u| Member::user(format!("shared-{u}@example.com")))
        .collect();
    groups.insert("shared@example.com".to_string(), shared);

    for g in 0..width {
        let name = format!("team-{g}@example.com");
        groups.insert(
            name.clone(),
            vec![
                Member::user(format!("lead-{g}@example.com")),
                Member::group("shared@example.com"),
            ],
        );
        mapping.insert_roles(name, [format!("role-{g}")]);
    }

    (SyntheticDirectory { groups }, mapping)
}

fn bench_nested_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion/chain");

    for depth in [2, 8, 24] {
        let directory: Arc<dyn Directory> = Arc::new(chain_directory(depth, 20));
        let mut mapping = GroupRoleMapping::new();
        mapping.insert_roles("group-0@example.com", ["reader".to_string()]);

        group.throughput(Throughput::Elements((depth * 20) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.to_async(tokio::runtime::Runtime::new().unwrap())
                .iter(|| async {
                    let resolver = GroupResolver::new(directory.clone(), ResolverConfig::default());
                    black_box(resolver.resolve_all(black_box(&mapping)).await)
                });
        });
    }

    group.finish();
}

fn bench_shared_membership(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion/shared");

    for width in [4, 32, 128] {
        let (directory, mapping) = shared_directory(width, 200);
        let directory: Arc<dyn Directory> = Arc::new(directory);

        for concurrency in [1, 8] {
            let config = ResolverConfig {
                max_concurrency: concurrency,
                ..ResolverConfig::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("concurrency_{concurrency}"), width),
                &width,
                |b, _| {
                    b.to_async(tokio::runtime::Runtime::new().unwrap())
                        .iter(|| async {
                            let resolver = GroupResolver::new(directory.clone(), config.clone());
                            black_box(resolver.resolve_all(black_box(&mapping)).await)
                        });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_nested_chain, bench_shared_membership);
criterion_main!(benches);
