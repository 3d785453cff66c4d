//! Partition and region metadata for the services we talk to.
//!
//! This table mirrors the service metadata shipped with the AWS SDKs and
//! will need updating as CodeCommit launches in new regions.

/// A partition along with the CodeCommit regions inside it.
pub struct Partition {
    pub name: &'static str,
    pub codecommit: &'static [&'static str],
}

/// All partitions known to this build, in lookup order.
pub static PARTITIONS: &[Partition] = &[
    Partition {
        name: "aws",
        codecommit: &[
            "af-south-1",
            "ap-east-1",
            "ap-northeast-1",
            "ap-northeast-2",
            "ap-northeast-3",
            "ap-south-1",
            "ap-southeast-1",
            "ap-southeast-2",
            "ap-southeast-3",
            "ca-central-1",
            "eu-central-1",
            "eu-north-1",
            "eu-south-1",
            "eu-west-1",
            "eu-west-2",
            "eu-west-3",
            "il-central-1",
            "me-central-1",
            "me-south-1",
            "sa-east-1",
            "us-east-1",
            "us-east-2",
            "us-west-1",
            "us-west-2",
        ],
    },
    Partition {
        name: "aws-cn",
        codecommit: &["cn-north-1", "cn-northwest-1"],
    },
    Partition {
        name: "aws-us-gov",
        codecommit: &["us-gov-east-1", "us-gov-west-1"],
    },
];

/// Returns the names of all known partitions.
pub fn partitions() -> Vec<String> {
    PARTITIONS.iter().map(|p| p.name.to_string()).collect()
}

/// Returns the regions of a partition offering the named service.
///
/// Unknown services and partitions yield no regions at all.
pub fn regions(service: &str, partition: &str) -> Vec<String> {
    if service != "codecommit" {
        return Vec::new();
    }

    PARTITIONS
        .iter()
        .filter(|p| p.name == partition)
        .flat_map(|p| p.codecommit.iter())
        .map(|r| r.to_string())
        .collect()
}
