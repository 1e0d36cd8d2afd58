use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKey {
    LuluBot,
    Rag,
    Coa,
    Antibody,
    LibreChat,
    Graph,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Project {
    pub key: ProjectKey,
    pub title: &'static str,
    pub description: &'static str,
}

pub const PROJECTS: [Project; 6] = [
    Project {
        key: ProjectKey::LuluBot,
        title: "LuluBot",
        description: "A multi-agent sales intelligence platform built with LangGraph. It orchestrates web research, transaction analysis, and marketing intelligence agents to identify untapped product opportunities.",
    },
    Project {
        key: ProjectKey::Rag,
        title: "Technical Service RAG Agent",
        description: "A production RAG system that searches 100K+ Salesforce cases and Egnyte documentation to answer technical questions instantly. Deployed via Microsoft Teams.",
    },
    Project {
        key: ProjectKey::Coa,
        title: "CoA Data Pipeline",
        description: "Template-based extraction system processing ~1M Certificate of Analysis PDFs with high accuracy. Built on Databricks with Delta Lake.",
    },
    Project {
        key: ProjectKey::Antibody,
        title: "Antibody Pair Prediction",
        description: "Semi-supervised ML pipeline using teacher-student learning with XGBoost to predict optimal capture-detect antibody pairs.",
    },
    Project {
        key: ProjectKey::LibreChat,
        title: "Enterprise ChatGPT",
        description: "Deployed LibreChat as an internal ChatGPT alternative with SSO integration, usage tracking, and compliance features.",
    },
    Project {
        key: ProjectKey::Graph,
        title: "Graph Recommendation Engine",
        description: "Graph-based recommendation pipeline leveraging product relationships and customer behavior for explainable suggestions.",
    },
];

pub const EXPERTISE: [&str; 7] = [
    "Multi-Agent Systems (LangGraph, LangChain)",
    "RAG Architectures & Vector Databases",
    "Machine Learning (XGBoost, Semi-supervised Learning)",
    "Databricks & Spark",
    "Azure OpenAI & Cloud Infrastructure",
    "Biotechnology & Life Sciences Domain",
    "Production ML Deployment",
];

impl ProjectKey {
    pub fn project(self) -> &'static Project {
        match self {
            Self::LuluBot => &PROJECTS[0],
            Self::Rag => &PROJECTS[1],
            Self::Coa => &PROJECTS[2],
            Self::Antibody => &PROJECTS[3],
            Self::LibreChat => &PROJECTS[4],
            Self::Graph => &PROJECTS[5],
        }
    }

    pub fn title(self) -> &'static str {
        self.project().title
    }
}
