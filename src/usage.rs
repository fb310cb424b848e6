//! Usage texts printed when a command is called without its required
//! positional arguments. Printing usage is not an error.

pub const SET_API_KEYS: &str = "\
Usage: vectara set-api-keys <customer_id> <api_key>

Stores the customer id and API key in the [credentials] table of the config
file, replacing any previous value. Keys are not checked until the service
is called.";

pub const CREATE_CORPUS: &str = "\
Usage: vectara create-corpus <corpus_id> <name> <description> [options]

Arguments:
    <corpus_id>    The unique identifier for the corpus. Must be an integer.
    <name>         The name of the corpus.
    <description>  A brief description of what the corpus is about.

Options:
    --custom_dimensions JSON_STRING  A JSON object; each key/value pair becomes a custom
                                     dimension (name, description).
    --filter_attributes JSON_STRING  A JSON object; each key/value pair becomes an indexed,
                                     document-level text filter attribute.
    --public BOOLEAN                 Make the corpus public (true) or private (false). Default is false.

Examples:
    vectara create-corpus 123 \"My Corpus\" \"A corpus containing documents on topic XYZ\"
    vectara create-corpus 456 \"Research Papers\" \"Academic papers\" --custom_dimensions '{\"subject\": \"Computer Science\"}'
    vectara create-corpus 789 \"Public Data\" \"A corpus of public datasets\" --public true

The service may assign a different id; the id it returns is printed.";

pub const CREATE_CORPUS_ADVANCED: &str = "\
Usage: vectara create-corpus-advanced <name> <description> [options]

Arguments:
    <name>         The name of the corpus.
    <description>  A brief description of what the corpus is about.

Options:
    --custom_dimensions JSON_STRING  Custom dimensions as a JSON object.
    --filter_attributes JSON_STRING  Filter attributes as a JSON object.
    --public BOOLEAN                 Public (true) or private (false). Default is false.
    --encoder_id INT                 Encoder ID, default is 1.
    --metadata_max_bytes INT         Maximum metadata bytes, default is 10000.
    --swap_qenc BOOLEAN              Swap query encoder, default is false.
    --swap_ienc BOOLEAN              Swap index encoder, default is false.
    --textless BOOLEAN               Textless corpus, default is false.
    --encrypted BOOLEAN              Encrypted corpus, default is true.

Examples:
    vectara create-corpus-advanced \"My Corpus\" \"A corpus containing documents on topic XYZ\"
    vectara create-corpus-advanced \"Public Data\" \"A corpus of public datasets\" --public true";

pub const DELETE_CORPUS: &str = "\
Usage: vectara delete-corpus <corpus_id>

Deletes the corpus and everything indexed in it.";

pub const INDEX_DOCUMENT: &str = "\
Usage: vectara index-document <corpus_id> <document_id> <title> <metadata_json> <section_text>

Arguments:
    <corpus_id>      The ID of the corpus where the document will be indexed. (integer)
    <document_id>    A unique identifier for the document.
    <title>          The title of the document.
    <metadata_json>  A JSON object with metadata for the document.
    <section_text>   The main content of the document.

Example:
    vectara index-document 123 001 \"My Document Title\" '{\"author\":\"John Doe\",\"year\":2022}' \"This is the main content.\"";

pub const INDEX_TEXT: &str = "\
Usage: vectara index-text <corpus_id> <document_id> <text> [metadata_json]

Indexes a single piece of text. metadata_json defaults to {}.";

pub const UPLOAD_DOCUMENT: &str = "\
Usage: vectara upload-document <corpus_id> <file_path>

Uploads one file; the service extracts and indexes its text.";

pub const UPLOAD_FOLDER: &str = "\
Usage: vectara upload-folder <corpus_id> <folder_path>

Uploads every file directly inside the folder, one at a time. A failed file
is reported and does not stop the others.";

pub const QUERY: &str = "\
Usage: vectara query <corpus_id> <query> [--num-results N] [--filter EXPR]";

pub const SPAN_TEXT: &str = "\
Usage: vectara span-text <model_name> <text> [--model-type span_marker|spacy]

Known models: fewnerdsuperfine, multinerd, largeontonote (plus any listed
under [ner.models] in the config file).";

pub const SPAN_ENHANCE_FOLDER: &str = "\
Usage: vectara span-enhance-folder <corpus_id_1> <corpus_id_2> <model_name> <folder_path>

Uploads the folder to corpus_id_1 (plain), then indexes every extracted
chunk into corpus_id_2 (enhanced) with the entities found in it as metadata.";

pub const PROCESS_AND_UPLOAD: &str = "\
Usage: vectara process-and-upload <model_name> <folder_path>

Creates a plain and an enhanced corpus, then runs span-enhance-folder
against them.";
