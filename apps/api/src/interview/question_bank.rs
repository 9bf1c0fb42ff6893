//! Question Bank: maps declared technologies to tiered template questions.
//!
//! Selection is deterministic: the same stack, experience and table always yield
//! the same questions in the same order.
//!
//! Algorithm:
//! 1. Resolve each declared technology to a keyword (exact alias/token match first,
//!    then substring match on aliases of 4+ characters). Unresolved → generic pool.
//! 2. Truncate declarations to `max_count`, in declaration order.
//! 3. Pick one unused template per declaration at the experience tier, else the
//!    nearest tier (lower tier wins a tie). An exhausted pool falls through to generic.
//! 4. Fill up to `min_count` from the generic pool without repeats.

use std::collections::HashSet;

use tracing::debug;

use crate::interview::models::{DifficultyTier, TechnicalQuestion};

pub const GENERAL_TECHNOLOGY: &str = "general";

/// Minimum alias length eligible for substring matching ("go" must not match "django").
const MIN_SUBSTRING_ALIAS_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub tier: DifficultyTier,
    pub text: &'static str,
}

#[derive(Debug, Clone)]
pub struct TopicPool {
    pub keyword: &'static str,
    pub aliases: &'static [&'static str],
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    topics: Vec<TopicPool>,
    general: Vec<Template>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new(default_topics(), default_general())
    }
}

impl QuestionBank {
    pub fn new(topics: Vec<TopicPool>, general: Vec<Template>) -> Self {
        Self { topics, general }
    }

    /// Resolves a free-text technology to a topic index.
    pub fn match_topic(&self, declared: &str) -> Option<usize> {
        let declared = declared.trim().to_lowercase();
        if declared.is_empty() {
            return None;
        }

        let tokens: Vec<&str> = declared
            .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
            .map(|t| t.trim_end_matches('.'))
            .filter(|t| !t.is_empty())
            .collect();

        let exact = self.topics.iter().position(|topic| {
            topic
                .aliases
                .iter()
                .any(|alias| *alias == declared || tokens.contains(alias))
        });
        if exact.is_some() {
            return exact;
        }

        self.topics.iter().position(|topic| {
            topic
                .aliases
                .iter()
                .filter(|alias| alias.len() >= MIN_SUBSTRING_ALIAS_LEN)
                .any(|alias| declared.contains(alias))
        })
    }

    /// Builds the question set for a declared stack.
    pub fn generate(
        &self,
        tech_stack: &[String],
        years_experience: f64,
        min_count: usize,
        max_count: usize,
    ) -> Vec<TechnicalQuestion> {
        let tier = DifficultyTier::for_experience(years_experience);
        let max_count = max_count.max(min_count);

        let mut used: HashSet<&'static str> = HashSet::new();
        let mut picked: Vec<(String, Template)> = Vec::new();

        for declared in tech_stack.iter().take(max_count) {
            let from_topic = self.match_topic(declared).and_then(|idx| {
                let topic = &self.topics[idx];
                pick_nearest(&topic.templates, tier, &used).map(|t| (topic.keyword, t))
            });

            let choice = from_topic.or_else(|| {
                pick_nearest(&self.general, tier, &used).map(|t| (GENERAL_TECHNOLOGY, t))
            });

            match choice {
                Some((technology, template)) => {
                    debug!("'{declared}' → {technology} ({})", template.tier.as_str());
                    used.insert(template.text);
                    picked.push((technology.to_string(), template));
                }
                None => debug!("No unused template left for '{declared}'"),
            }
        }

        while picked.len() < min_count {
            match pick_nearest(&self.general, tier, &used) {
                Some(template) => {
                    used.insert(template.text);
                    picked.push((GENERAL_TECHNOLOGY.to_string(), template));
                }
                None => break,
            }
        }

        picked
            .into_iter()
            .take(max_count)
            .enumerate()
            .map(|(i, (technology, template))| TechnicalQuestion {
                technology,
                difficulty: template.tier,
                question_text: template.text.to_string(),
                sequence_index: i,
            })
            .collect()
    }
}

/// First unused template at the tier closest to `tier`; ties go to the lower tier.
fn pick_nearest(
    templates: &[Template],
    tier: DifficultyTier,
    used: &HashSet<&'static str>,
) -> Option<Template> {
    templates
        .iter()
        .filter(|t| !used.contains(t.text))
        .min_by_key(|t| (t.tier.rank().abs_diff(tier.rank()), t.tier.rank()))
        .cloned()
}

// ────────────────────────────────────────────────────────────────────────────
// Template table
// ────────────────────────────────────────────────────────────────────────────

fn tiered(junior: &'static str, mid: &'static str, senior: &'static str) -> Vec<Template> {
    vec![
        Template {
            tier: DifficultyTier::Junior,
            text: junior,
        },
        Template {
            tier: DifficultyTier::Mid,
            text: mid,
        },
        Template {
            tier: DifficultyTier::Senior,
            text: senior,
        },
    ]
}

fn topic(
    keyword: &'static str,
    aliases: &'static [&'static str],
    templates: Vec<Template>,
) -> TopicPool {
    TopicPool {
        keyword,
        aliases,
        templates,
    }
}

pub fn default_topics() -> Vec<TopicPool> {
    vec![
        topic(
            "python",
            &["python", "python3", "py"],
            tiered(
                "What is the difference between a list and a tuple in Python, and when would you use each?",
                "How do generators work in Python, and when would you prefer one over building a list?",
                "How does the GIL affect CPU-bound and I/O-bound workloads in CPython, and how do you design around it?",
            ),
        ),
        topic(
            "django",
            &["django"],
            tiered(
                "What are Django models and migrations, and how do they relate to each other?",
                "How does the Django ORM evaluate querysets lazily, and how do select_related and prefetch_related differ?",
                "How would you scale a Django application handling heavy read traffic and long-running background work?",
            ),
        ),
        topic(
            "flask",
            &["flask"],
            tiered(
                "How do you define a route in Flask and read query parameters from a request?",
                "How do Flask application and request contexts work?",
                "How would you structure a large Flask codebase with blueprints, configuration and an application factory?",
            ),
        ),
        topic(
            "javascript",
            &["javascript", "js", "ecmascript", "es6"],
            tiered(
                "What is the difference between let, const and var in JavaScript?",
                "Explain the JavaScript event loop and how promises are scheduled relative to timers.",
                "How do closures cause memory leaks in long-lived JavaScript applications, and how do you find them?",
            ),
        ),
        topic(
            "typescript",
            &["typescript", "ts"],
            tiered(
                "What is the difference between an interface and a type alias in TypeScript?",
                "How do generics and type narrowing work together in TypeScript?",
                "How would you use conditional and mapped types to model a strongly typed API client?",
            ),
        ),
        topic(
            "react",
            &["react", "reactjs", "react.js"],
            tiered(
                "What is the difference between props and state in React?",
                "When does a React component re-render, and how do useMemo and useCallback help?",
                "How would you design state management and data fetching for a large React application?",
            ),
        ),
        topic(
            "node.js",
            &["node", "nodejs", "node.js", "express"],
            tiered(
                "What is npm, and what is the role of package.json in a Node.js project?",
                "How does Node.js handle concurrent requests on a single thread?",
                "How would you diagnose and fix event-loop blocking in a production Node.js service?",
            ),
        ),
        topic(
            "java",
            &["java", "jvm"],
            tiered(
                "What is the difference between an abstract class and an interface in Java?",
                "How do HashMap and ConcurrentHashMap differ in Java, and when would you use each?",
                "How do you tune JVM garbage collection for a latency-sensitive service?",
            ),
        ),
        topic(
            "spring",
            &["spring", "spring boot", "springboot"],
            tiered(
                "What is dependency injection, and how does Spring provide it?",
                "How do Spring transaction boundaries work with @Transactional?",
                "How would you design resilient inter-service communication in a Spring Boot microservice system?",
            ),
        ),
        topic(
            "go",
            &["go", "golang"],
            tiered(
                "What are goroutines, and how do they differ from OS threads?",
                "How do channels and select work in Go, and when would you use a mutex instead?",
                "How would you find and fix a goroutine leak in a long-running Go service?",
            ),
        ),
        topic(
            "rust",
            &["rust"],
            tiered(
                "What does ownership mean in Rust, and what happens when a value is moved?",
                "How do lifetimes relate to borrowing, and when do you need to annotate them explicitly?",
                "How would you design a concurrent Rust service that shares state across async tasks safely?",
            ),
        ),
        topic(
            "c++",
            &["c++", "cpp"],
            tiered(
                "What is the difference between a pointer and a reference in C++?",
                "Explain RAII and how smart pointers implement it in C++.",
                "How do move semantics and perfect forwarding reduce copies in C++ libraries?",
            ),
        ),
        topic(
            "c#",
            &["c#", "csharp", ".net", "dotnet"],
            tiered(
                "What is the difference between a value type and a reference type in C#?",
                "How does async/await work in C#, and what is the role of the synchronization context?",
                "How would you profile and reduce allocations in a high-throughput .NET service?",
            ),
        ),
        topic(
            "sql",
            &["sql", "mysql", "sqlite", "t-sql"],
            tiered(
                "What is the difference between an INNER JOIN and a LEFT JOIN?",
                "How do indexes speed up queries, and when can they hurt performance?",
                "How would you diagnose and fix a slow query in a large production database?",
            ),
        ),
        topic(
            "postgresql",
            &["postgresql", "postgres", "psql"],
            tiered(
                "What is a primary key, and how does PostgreSQL enforce it?",
                "How does PostgreSQL MVCC work, and why does VACUUM matter?",
                "How would you plan a zero-downtime schema migration on a large PostgreSQL table?",
            ),
        ),
        topic(
            "mongodb",
            &["mongodb", "mongo"],
            tiered(
                "How does a MongoDB document differ from a row in a relational table?",
                "How do you design MongoDB indexes for compound queries?",
                "How would you choose a shard key for a write-heavy MongoDB collection?",
            ),
        ),
        topic(
            "docker",
            &["docker", "dockerfile", "containers"],
            tiered(
                "What is the difference between a Docker image and a container?",
                "How do multi-stage builds reduce Docker image size?",
                "How would you harden Docker images and runtime configuration for production?",
            ),
        ),
        topic(
            "kubernetes",
            &["kubernetes", "k8s"],
            tiered(
                "What is a Pod in Kubernetes, and how does it relate to a Deployment?",
                "How do readiness and liveness probes differ in Kubernetes?",
                "How would you design autoscaling and rollout strategy for a critical service on Kubernetes?",
            ),
        ),
        topic(
            "aws",
            &["aws", "amazon web services", "ec2", "s3", "lambda"],
            tiered(
                "What is the difference between EC2 and S3 on AWS?",
                "How do IAM roles and policies control access between AWS services?",
                "How would you design a highly available, multi-AZ architecture on AWS?",
            ),
        ),
        topic(
            "machine learning",
            &["machine learning", "ml", "scikit-learn", "sklearn", "pytorch", "tensorflow"],
            tiered(
                "What is the difference between supervised and unsupervised learning?",
                "How do you detect and handle overfitting in a model?",
                "How would you monitor and retrain a production model affected by data drift?",
            ),
        ),
        topic(
            "git",
            &["git", "github", "gitlab"],
            tiered(
                "What is the difference between git merge and git rebase?",
                "How would you recover a commit lost after a hard reset in Git?",
                "How would you design a branching and release strategy for a team of 30 engineers?",
            ),
        ),
    ]
}

pub fn default_general() -> Vec<Template> {
    let mut general = tiered(
        "How do you approach learning a new technology or framework?",
        "Describe a time when you had to debug a complex issue. How did you find the root cause?",
        "Describe the most challenging system you have designed and the trade-offs you made.",
    );
    general.extend(tiered(
        "How do you make sure the code you write works as intended?",
        "How do you ensure code quality in your projects?",
        "How do you balance technical debt against delivery deadlines on a team?",
    ));
    general.extend(tiered(
        "Tell me about a project you are proud of and your role in it.",
        "Describe your most challenging technical project and how you solved it.",
        "How would you mentor a junior engineer through their first production incident?",
    ));
    general
}
