use super::{AuthorSignature, Error, Object, ObjectType, Result, Sha1Hash};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    tree: Sha1Hash,
    parent: Option<Sha1Hash>,
    author: AuthorSignature,
    committer: AuthorSignature,
    message: String,
}

impl Commit {
    pub fn new(
        tree: Sha1Hash,
        parent: Option<Sha1Hash>,
        author: AuthorSignature,
        committer: AuthorSignature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parent,
            author,
            committer,
            message: message.into(),
        }
    }

    pub fn tree(&self) -> Sha1Hash {
        self.tree
    }

    pub fn parent(&self) -> Option<Sha1Hash> {
        self.parent
    }

    pub fn author(&self) -> &AuthorSignature {
        &self.author
    }

    pub fn committer(&self) -> &AuthorSignature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Object for Commit {
    const TYPE: ObjectType = ObjectType::Commit;

    fn encode(&self) -> Vec<u8> {
        let parent = self
            .parent
            .map(|parent| format!("parent {parent}\n"))
            .unwrap_or_default();
        format!(
            "tree {}\n{parent}author {}\ncommitter {}\n\n{}",
            self.tree, self.author, self.committer, self.message
        )
        .into_bytes()
    }

    fn decode(content: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(content)
            .map_err(|err| Error::corrupt_object(format!("commit is not utf-8: {err}")))?;

        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| Error::corrupt_object("commit has no blank line before its message"))?;

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;

        for line in headers.split('\n') {
            // Continuation of a multi-line header such as gpgsig.
            if line.starts_with(' ') {
                continue;
            }
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| Error::corrupt_object(format!("malformed commit header: {line:?}")))?;
            match key {
                "tree" => tree = Some(value.parse::<Sha1Hash>()?),
                // Only the first parent of a merge is kept.
                "parent" if parent.is_none() => parent = Some(value.parse::<Sha1Hash>()?),
                "author" => author = Some(value.parse::<AuthorSignature>()?),
                "committer" => committer = Some(value.parse::<AuthorSignature>()?),
                _ => {}
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| Error::corrupt_object("commit is missing its tree"))?,
            parent,
            author: author.ok_or_else(|| Error::corrupt_object("commit is missing its author"))?,
            committer: committer
                .ok_or_else(|| Error::corrupt_object("commit is missing its committer"))?,
            message: message.to_string(),
        })
    }
}
