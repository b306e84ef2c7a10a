mod cat_file;
mod clone;
mod commit_tree;
mod hash_object;
mod init;
mod ls_tree;
mod write_tree;

use super::{Args, Error, ObjectStore, Result, Sha1Hash};

const WORK_DIR: &str = ".";

#[derive(Debug, PartialEq)]
pub enum Command {
    Init,
    CatFile {
        hash: Sha1Hash,
    },
    HashObject {
        path: String,
        write: bool,
    },
    LsTree {
        hash: Sha1Hash,
        name_only: bool,
    },
    WriteTree,
    CommitTree {
        tree: Sha1Hash,
        parent: Option<Sha1Hash>,
        message: String,
    },
    Clone {
        url: String,
        dir: String,
    },
    Unknown(String),
}

impl Command {
    pub fn new(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Err(Error::InvalidArgs("no command given".into()));
        };

        let cmd = match name.as_str() {
            "init" => Self::Init,
            "cat-file" => {
                let args = Args::parse(rest, &["-p"]);
                Self::CatFile {
                    hash: parse_hash(required(args.option("-p"), "-p")?)?,
                }
            }
            "hash-object" => {
                let args = Args::parse(rest, &[]);
                Self::HashObject {
                    path: required(args.position(0), "file")?,
                    write: args.flag("-w"),
                }
            }
            "ls-tree" => {
                let args = Args::parse(rest, &[]);
                Self::LsTree {
                    hash: parse_hash(required(args.position(0), "tree")?)?,
                    name_only: args.flag("--name-only"),
                }
            }
            "write-tree" => Self::WriteTree,
            "commit-tree" => {
                let args = Args::parse(rest, &["-p", "-m"]);
                Self::CommitTree {
                    tree: parse_hash(required(args.position(0), "tree")?)?,
                    parent: args.option("-p").map(parse_hash).transpose()?,
                    message: required(args.option("-m"), "-m")?,
                }
            }
            "clone" => {
                let args = Args::parse(rest, &[]);
                let url = required(args.position(0), "url")?;
                let dir = args.position(1).unwrap_or_else(|| default_dir(&url));
                Self::Clone { url, dir }
            }
            other => Self::Unknown(other.into()),
        };
        Ok(cmd)
    }

    pub async fn run(self) -> Result<()> {
        match self {
            Self::Init => init::run(WORK_DIR),
            Self::CatFile { hash } => cat_file::run(WORK_DIR, hash),
            Self::HashObject { path, write } => hash_object::run(WORK_DIR, path, write),
            Self::LsTree { hash, name_only } => ls_tree::run(WORK_DIR, hash, name_only),
            Self::WriteTree => write_tree::run(WORK_DIR),
            Self::CommitTree {
                tree,
                parent,
                message,
            } => commit_tree::run(WORK_DIR, tree, parent, message),
            Self::Clone { url, dir } => clone::run(url, dir).await,
            Self::Unknown(name) => Err(format!("Unknown command: {name}").as_str().into()),
        }
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value.ok_or_else(|| Error::InvalidArgs(format!("argument \"{name}\" is required")))
}

fn parse_hash(value: String) -> Result<Sha1Hash> {
    value
        .parse()
        .map_err(|err| Error::InvalidArgs(format!("{value}: {err}")))
}

/// `https://host/owner/repo.git` clones into `repo`.
fn default_dir(url: &str) -> String {
    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url);
    name.strip_suffix(".git").unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    const HASH: &str = "3b1031798a00fdf9b574b5857b1721bc4b0e6bac";

    #[test]
    fn it_parses_cat_file() {
        let cmd = Command::new(&args(&["cat-file", "-p", HASH])).unwrap();
        assert_eq!(
            cmd,
            Command::CatFile {
                hash: HASH.parse().unwrap()
            }
        );
    }

    #[test]
    fn it_parses_commit_tree() {
        let cmd = Command::new(&args(&["commit-tree", HASH, "-p", HASH, "-m", "hello"])).unwrap();
        assert_eq!(
            cmd,
            Command::CommitTree {
                tree: HASH.parse().unwrap(),
                parent: Some(HASH.parse().unwrap()),
                message: "hello".into(),
            }
        );
    }

    #[test]
    fn it_parses_clone_with_default_dir() {
        let cmd = Command::new(&args(&["clone", "https://github.com/foo/bar.git"])).unwrap();
        assert_eq!(
            cmd,
            Command::Clone {
                url: "https://github.com/foo/bar.git".into(),
                dir: "bar".into(),
            }
        );
    }

    #[test]
    fn it_rejects_missing_arguments() {
        assert!(matches!(
            Command::new(&args(&["cat-file"])),
            Err(Error::InvalidArgs(_))
        ));
        assert!(matches!(
            Command::new(&args(&["ls-tree", "--name-only", "nothex"])),
            Err(Error::InvalidArgs(_))
        ));
        assert!(matches!(Command::new(&[]), Err(Error::InvalidArgs(_))));
    }
}
