// Criterion benchmarks for Job Matcher

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use job_matcher::core::{jitter::apply_jitter, skills::normalize, Matcher, ScoringEngine};
use job_matcher::models::{CandidateProfile, Education, Experience, JobPosting};

const SKILL_POOL: &[&str] = &[
    "Python", "SQL", "Docker", "Kubernetes", "Rust", "Go", "AWS", "Terraform", "React", "Pandas",
];

fn create_posting(id: usize) -> JobPosting {
    JobPosting {
        id: format!("job-{}", id),
        title: format!("Backend Engineer {}", id),
        company: format!("Company {}", id % 17),
        location: "Berlin".to_string(),
        description: "We build data platforms with Python, Docker and Kubernetes.".to_string(),
        required_skills: (0..4)
            .map(|k| SKILL_POOL[(id + k * 3) % SKILL_POOL.len()].to_string())
            .collect(),
        experience_required: "3 years of experience as a backend engineer".to_string(),
        education_required: "Bachelor degree in Computer Science".to_string(),
        language: "en".to_string(),
        qualifications: vec![],
        apply_url: String::new(),
        remote: id % 2 == 0,
        job_types: vec![],
        synthetic: false,
    }
}

fn create_profile() -> CandidateProfile {
    CandidateProfile {
        skills: vec!["Python".to_string(), "SQL".to_string(), "Docker".to_string()],
        experience: vec![Experience {
            title: "Backend Engineer".to_string(),
            company: "Ferris Systems".to_string(),
            duration_years: 4.0,
        }],
        education: vec![Education {
            degree: "Master of Science".to_string(),
            field: "Computer Science".to_string(),
            institution: "TU Munich".to_string(),
        }],
    }
}

fn bench_jitter(c: &mut Criterion) {
    c.bench_function("apply_jitter", |b| {
        b.iter(|| apply_jitter(black_box(63.4), black_box("Data Scientist"), black_box("TechCorp")));
    });
}

fn bench_score(c: &mut Criterion) {
    let engine = ScoringEngine::default();
    let profile = create_profile();
    let posting = create_posting(1);

    c.bench_function("score_single_posting", |b| {
        b.iter(|| engine.score(black_box(&profile), black_box(&posting)));
    });
}

fn bench_normalize(c: &mut Criterion) {
    let tags: Vec<String> = vec!["Python".into(), "location:Berlin".into(), "Data Science".into()];
    let description = "Join our developer team. You know Python, SQL, React and Docker; \
                       experience with AWS or GCP is a plus. Git and Agile are daily tools.";

    c.bench_function("normalize_skills", |b| {
        b.iter(|| normalize(black_box(&tags), black_box("Senior Developer"), black_box(description)));
    });
}

fn bench_match_all(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let matcher = Matcher::with_default_weights();
    let profile = create_profile();

    let mut group = c.benchmark_group("match_all");

    for posting_count in [10, 100, 500].iter() {
        let postings: Vec<JobPosting> = (0..*posting_count).map(create_posting).collect();

        group.bench_with_input(
            BenchmarkId::new("deterministic", posting_count),
            posting_count,
            |b, _| {
                b.to_async(&runtime).iter(|| {
                    matcher.match_all(black_box(&profile), black_box(postings.clone()))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_jitter,
    bench_score,
    bench_normalize,
    bench_match_all
);

criterion_main!(benches);
